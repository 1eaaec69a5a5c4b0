use idl_codec::{
    discriminator_for, prepend_discriminator, strip_and_validate, CodecError, Discriminator,
    DiscriminatorTable, ErrorKind, Field, IdlInstruction, Namespace, Program, ProgramIdl,
    TypeDescriptor,
};
use idl_codec_tests::{anchor_discriminator, basic_2_idl, example_program_idl, BASIC_2_PROGRAM_ID};

fn hex(d: Discriminator) -> String {
    d.to_string()
}

#[test]
fn test_known_instruction_discriminators() {
    assert_eq!(hex(Discriminator::for_instruction("increment")), "0b12680968ae3b21");
    assert_eq!(hex(Discriminator::for_instruction("create")), "181ec828051c0777");
    assert_eq!(hex(Discriminator::for_instruction("play")), "d59dc18ee438f896");
    assert_eq!(hex(Discriminator::for_instruction("initialize")), "afaf6d1f0d989bed");
}

#[test]
fn test_camel_case_instruction_names_hash_as_snake_case() {
    assert_eq!(
        Discriminator::for_instruction("causeError"),
        Discriminator::for_instruction("cause_error")
    );
    assert_eq!(hex(Discriminator::for_instruction("causeError")), "43682511029b4411");
}

#[test]
fn test_known_account_discriminators() {
    assert_eq!(hex(Discriminator::for_account("Game")), "1b5aa67d4a647912");
    assert_eq!(hex(Discriminator::for_account("Counter")), "ffb004f5bcfd7c19");
}

#[test]
fn test_discriminators_match_independent_hash() {
    for name in ["increment", "create", "play", "initialize"] {
        assert_eq!(
            Discriminator::for_instruction(name).0,
            anchor_discriminator("global", name)
        );
    }
    for name in ["Game", "Counter"] {
        assert_eq!(
            discriminator_for(Namespace::Account, name).0,
            anchor_discriminator("account", name)
        );
    }
}

#[test]
fn test_prepend_and_strip() {
    let disc = Discriminator::for_instruction("create");
    let data = prepend_discriminator(&disc, &[1, 2, 3]);
    assert_eq!(data.len(), 11);
    assert_eq!(&data[..8], disc.as_bytes());
    assert_eq!(strip_and_validate(&disc, &data).unwrap(), &[1, 2, 3]);
}

#[test]
fn test_strip_rejects_short_and_foreign_data() {
    let disc = Discriminator::for_account("Game");

    let err = strip_and_validate(&disc, &[0x1b, 0x5a, 0xa6]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TruncatedInput);

    let other = Discriminator::for_account("Counter");
    let err = strip_and_validate(&disc, other.as_bytes()).unwrap_err();
    assert_eq!(
        err,
        CodecError::DiscriminatorMismatch {
            expected: disc,
            actual: other,
        }
    );
}

#[test]
fn test_parse_round_trips_display() {
    let disc = Discriminator::for_instruction("play");
    assert_eq!(disc.to_string().parse::<Discriminator>().unwrap(), disc);
    assert_eq!("0xd59dc18ee438f896".parse::<Discriminator>().unwrap(), disc);
    assert!("d59dc18e".parse::<Discriminator>().is_err());
}

#[test]
fn test_table_rejects_rebinding_a_name() {
    let mut table = DiscriminatorTable::new(Namespace::Instruction);
    table.register_name("increment").unwrap();
    // Same name, same discriminator is fine.
    table
        .register("increment", Discriminator::for_instruction("increment"))
        .unwrap();
    let err = table
        .register("increment", Discriminator::new([0; 8]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateDiscriminator);
    assert_eq!(table.len(), 1);
    assert_eq!(
        table.name_of(&Discriminator::for_instruction("increment")),
        Some("increment")
    );
}

#[test]
fn test_program_load_rejects_colliding_instruction_names() {
    // `doThing` and `do_thing` share the `global:do_thing` preimage.
    let idl = ProgramIdl::new("collide")
        .with_instruction(IdlInstruction::new("doThing"))
        .with_instruction(IdlInstruction::new("do_thing"));
    let err = Program::load(BASIC_2_PROGRAM_ID, &idl).unwrap_err();
    assert!(matches!(
        err,
        CodecError::DuplicateDiscriminator {
            namespace: Namespace::Instruction,
            ..
        }
    ));
}

#[test]
fn test_repeated_definitions_fail_load() {
    let twice_ix = ProgramIdl::new("repeat")
        .with_instruction(IdlInstruction::new("go"))
        .with_instruction(IdlInstruction::new("go").arg("speed", TypeDescriptor::U8));
    let err = Program::load(BASIC_2_PROGRAM_ID, &twice_ix).unwrap_err();
    assert_eq!(
        err,
        CodecError::DuplicateDiscriminator {
            namespace: Namespace::Instruction,
            name: "go".to_string(),
            existing: "go".to_string(),
        }
    );

    let twice_account = ProgramIdl::new("repeat")
        .with_account("A", TypeDescriptor::Struct(vec![]))
        .with_account("A", TypeDescriptor::Struct(vec![Field::new("n", TypeDescriptor::U64)]));
    let err = Program::load(BASIC_2_PROGRAM_ID, &twice_account).unwrap_err();
    assert!(matches!(
        err,
        CodecError::DuplicateDiscriminator {
            namespace: Namespace::Account,
            ..
        }
    ));

    let twice_type = ProgramIdl::new("repeat")
        .with_type("T", TypeDescriptor::U8)
        .with_type("T", TypeDescriptor::U64);
    let err = Program::load(BASIC_2_PROGRAM_ID, &twice_type).unwrap_err();
    assert_eq!(err, CodecError::DuplicateTypeName { name: "T".to_string() });
    assert_eq!(err.kind(), ErrorKind::DuplicateTypeName);
}

#[test]
fn test_instruction_and_account_namespaces_are_separate() {
    // An instruction and an account may share a name.
    let idl = basic_2_idl().with_instruction(IdlInstruction::new("Counter"));
    let program = Program::load(BASIC_2_PROGRAM_ID, &idl).unwrap();
    assert_ne!(
        program.instruction("Counter").unwrap().discriminator(),
        program.account("Counter").unwrap().discriminator()
    );
}

#[test]
fn test_loaded_program_discriminators() {
    let program = Program::load(idl_codec_tests::EXAMPLE_PROGRAM_ID, &example_program_idl()).unwrap();
    assert_eq!(
        hex(program.instruction("causeError").unwrap().discriminator()),
        "43682511029b4411"
    );
    assert_eq!(
        program.instruction("cause_error").unwrap().name(),
        "causeError"
    );
}
