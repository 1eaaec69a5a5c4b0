//! Layouts must agree byte-for-byte with `borsh` derives of the equivalent Rust types.

use borsh::{BorshDeserialize, BorshSerialize};
use idl_codec::{EnumVariant, Field, Layout, Program, Pubkey, TypeDescriptor, Value};
use idl_codec_tests::{tictactoe_idl, TICTACTOE_PROGRAM_ID};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq)]
enum Sign {
    X,
    O,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
enum GameState {
    Active,
    Tie,
    Won { winner: [u8; 32] },
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
struct Game {
    players: [[u8; 32]; 2],
    turn: u8,
    board: [[Option<Sign>; 3]; 3],
    state: GameState,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
enum Event {
    Ping,
    Moved(u8, i16),
    Renamed { from: String, to: String },
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
struct Mixed {
    ids: Vec<u32>,
    label: String,
    blob: Vec<u8>,
    limit: Option<i128>,
    pair: (u64, bool),
    ratio: f64,
    events: Vec<Event>,
}

fn sign_value(sign: Sign) -> Value {
    Value::unit_variant(match sign {
        Sign::X => "X",
        Sign::O => "O",
    })
}

fn game_value(game: &Game) -> Value {
    let board = game
        .board
        .iter()
        .map(|row| {
            Value::Array(
                row.iter()
                    .map(|cell| cell.map_or_else(Value::none, |s| Value::some(sign_value(s))))
                    .collect(),
            )
        })
        .collect();
    let state = match &game.state {
        GameState::Active => Value::unit_variant("Active"),
        GameState::Tie => Value::unit_variant("Tie"),
        GameState::Won { winner } => Value::struct_variant(
            "Won",
            [("winner", Value::from(Pubkey::new_from_array(*winner)))],
        ),
    };
    Value::structure([
        (
            "players",
            Value::Array(
                game.players
                    .iter()
                    .map(|p| Value::from(Pubkey::new_from_array(*p)))
                    .collect(),
            ),
        ),
        ("turn", Value::U8(game.turn)),
        ("board", Value::Array(board)),
        ("state", state),
    ])
}

fn sample_game() -> Game {
    Game {
        players: [[3; 32], [4; 32]],
        turn: 5,
        board: [
            [Some(Sign::X), None, Some(Sign::O)],
            [None, Some(Sign::X), None],
            [Some(Sign::O), None, None],
        ],
        state: GameState::Won { winner: [4; 32] },
    }
}

#[test]
fn test_game_body_matches_borsh() {
    let program = Program::load(TICTACTOE_PROGRAM_ID, &tictactoe_idl()).unwrap();
    let codec = program.account("Game").unwrap();
    let game = sample_game();

    let expected = borsh::to_vec(&game).unwrap();
    assert_eq!(codec.layout().encode(&game_value(&game)).unwrap(), expected);

    // Full account data is the discriminator followed by the same body.
    let data = codec.encode(&game_value(&game)).unwrap();
    assert_eq!(&data[..8], codec.discriminator().as_bytes());
    assert_eq!(&data[8..], &expected[..]);
}

#[test]
fn test_layout_decodes_borsh_bytes() {
    let program = Program::load(TICTACTOE_PROGRAM_ID, &tictactoe_idl()).unwrap();
    let layout = program.account("Game").unwrap().layout();
    for state in [GameState::Active, GameState::Tie, GameState::Won { winner: [9; 32] }] {
        let game = Game {
            state,
            ..sample_game()
        };
        let bytes = borsh::to_vec(&game).unwrap();
        assert_eq!(layout.decode_exact(&bytes).unwrap(), game_value(&game));
    }
}

fn mixed_layout() -> Layout {
    Layout::compile(&TypeDescriptor::Struct(vec![
        Field::new("ids", TypeDescriptor::vec(TypeDescriptor::U32)),
        Field::new("label", TypeDescriptor::STRING),
        Field::new("blob", TypeDescriptor::BYTES),
        Field::new("limit", TypeDescriptor::option(TypeDescriptor::I128)),
        Field::new(
            "pair",
            TypeDescriptor::Tuple(vec![TypeDescriptor::U64, TypeDescriptor::BOOL]),
        ),
        Field::new("ratio", TypeDescriptor::F64),
        Field::new(
            "events",
            TypeDescriptor::vec(TypeDescriptor::Enum(vec![
                EnumVariant::unit("Ping"),
                EnumVariant::tuple("Moved", vec![TypeDescriptor::U8, TypeDescriptor::I16]),
                EnumVariant::with_fields(
                    "Renamed",
                    vec![
                        Field::new("from", TypeDescriptor::STRING),
                        Field::new("to", TypeDescriptor::STRING),
                    ],
                ),
            ])),
        ),
    ]))
    .unwrap()
}

fn mixed_value(m: &Mixed) -> Value {
    let events = m
        .events
        .iter()
        .map(|e| match e {
            Event::Ping => Value::unit_variant("Ping"),
            Event::Moved(a, b) => Value::tuple_variant("Moved", vec![Value::U8(*a), Value::I16(*b)]),
            Event::Renamed { from, to } => Value::struct_variant(
                "Renamed",
                [("from", Value::from(from.as_str())), ("to", Value::from(to.as_str()))],
            ),
        })
        .collect();
    Value::structure([
        ("ids", Value::Array(m.ids.iter().copied().map(Value::U32).collect())),
        ("label", Value::from(m.label.as_str())),
        ("blob", Value::Bytes(m.blob.clone())),
        ("limit", m.limit.map_or_else(Value::none, |v| Value::some(Value::I128(v)))),
        ("pair", Value::Tuple(vec![Value::U64(m.pair.0), Value::Bool(m.pair.1)])),
        ("ratio", Value::F64(m.ratio)),
        ("events", Value::Array(events)),
    ])
}

#[test]
fn test_dynamic_members_match_borsh() {
    let layout = mixed_layout();
    let cases = [
        Mixed {
            ids: vec![],
            label: String::new(),
            blob: vec![],
            limit: None,
            pair: (0, false),
            ratio: 0.0,
            events: vec![],
        },
        Mixed {
            ids: vec![1, u32::MAX, 7],
            label: "héllo".to_string(),
            blob: vec![0, 1, 2, 255],
            limit: Some(i128::MIN),
            pair: (u64::MAX, true),
            ratio: -1.5,
            events: vec![
                Event::Moved(2, -300),
                Event::Ping,
                Event::Renamed {
                    from: "a".to_string(),
                    to: "bc".to_string(),
                },
            ],
        },
    ];

    for case in &cases {
        let borsh_bytes = borsh::to_vec(case).unwrap();
        let value = mixed_value(case);
        assert_eq!(layout.encode(&value).unwrap(), borsh_bytes, "{case:?}");
        assert_eq!(layout.decode_exact(&borsh_bytes).unwrap(), value);
        assert_eq!(Mixed::try_from_slice(&borsh_bytes).unwrap(), *case);
    }
}

#[test]
fn test_truncated_borsh_bytes_are_rejected() {
    let layout = mixed_layout();
    let bytes = borsh::to_vec(&Mixed {
        ids: vec![5; 3],
        label: "x".to_string(),
        blob: vec![9],
        limit: Some(1),
        pair: (2, true),
        ratio: 2.0,
        events: vec![Event::Ping],
    })
    .unwrap();
    for end in 0..bytes.len() {
        assert!(layout.decode_exact(&bytes[..end]).is_err(), "prefix of {end} bytes");
    }
}
