use idl_codec::{
    AccountFetcher, Accounts, ClientError, ErrorKind, Program, ProgramClient, Pubkey, RawAccount,
    Value,
};
use idl_codec_tests::{
    basic_2_idl, tictactoe_idl, MemoryAccounts, Offline, RecordingSink, BASIC_2_PROGRAM_ID,
    TICTACTOE_PROGRAM_ID,
};

const GAME: Pubkey = solana_pubkey::pubkey!("Game111111111111111111111111111111111111111");
const PLAYER: Pubkey = solana_pubkey::pubkey!("P1ayer1111111111111111111111111111111111111");

fn game(turn: u8) -> Value {
    let row = || Value::Array(vec![Value::none(), Value::none(), Value::none()]);
    Value::structure([
        ("players", Value::Array(vec![Value::from(PLAYER), Value::from(PLAYER)])),
        ("turn", Value::U8(turn)),
        ("board", Value::Array(vec![row(), row(), row()])),
        ("state", Value::unit_variant("Active")),
    ])
}

fn game_data(program: &Program, turn: u8) -> Vec<u8> {
    program.account("Game").unwrap().encode(&game(turn)).unwrap()
}

#[tokio::test]
async fn test_fetch_decodes_existing_account() {
    let program = Program::load(TICTACTOE_PROGRAM_ID, &tictactoe_idl()).unwrap();
    let fetcher = MemoryAccounts::new().with_account(GAME, TICTACTOE_PROGRAM_ID, game_data(&program, 2));
    let client = ProgramClient::new(&program, fetcher);

    let decoded = client.fetch("Game", &GAME).await.unwrap().unwrap();
    assert_eq!(decoded.value(), &game(2));
    assert_eq!(decoded.owner(), &TICTACTOE_PROGRAM_ID);

    let missing = client.fetch("Game", &Pubkey::new_unique()).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_fetch_rejects_foreign_owner() {
    let program = Program::load(TICTACTOE_PROGRAM_ID, &tictactoe_idl()).unwrap();
    let fetcher = MemoryAccounts::new().with_account(GAME, BASIC_2_PROGRAM_ID, game_data(&program, 2));
    let client = ProgramClient::new(&program, fetcher);

    match client.fetch("Game", &GAME).await {
        Err(ClientError::Codec(err)) => assert_eq!(err.kind(), ErrorKind::OwnershipMismatch),
        other => panic!("expected ownership error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_multiple_keeps_slot_order() {
    let program = Program::load(TICTACTOE_PROGRAM_ID, &tictactoe_idl()).unwrap();
    let a = Pubkey::new_unique();
    let b = Pubkey::new_unique();
    let corrupt = Pubkey::new_unique();
    let fetcher = MemoryAccounts::new()
        .with_account(a, TICTACTOE_PROGRAM_ID, game_data(&program, 1))
        .with_account(b, TICTACTOE_PROGRAM_ID, game_data(&program, 2))
        .with_account(corrupt, TICTACTOE_PROGRAM_ID, vec![0; 8]);
    let client = ProgramClient::new(&program, fetcher);

    let slots = client
        .fetch_multiple("Game", &[b, Pubkey::new_unique(), corrupt, a])
        .await
        .unwrap();
    assert_eq!(slots.len(), 4);
    assert_eq!(slots[0].as_ref().unwrap().as_ref().unwrap().value(), &game(2));
    assert!(slots[1].is_none());
    assert_eq!(
        slots[2].as_ref().unwrap().as_ref().unwrap_err().kind(),
        ErrorKind::DiscriminatorMismatch
    );
    assert_eq!(slots[3].as_ref().unwrap().as_ref().unwrap().value(), &game(1));
    assert_eq!(client.fetcher().fetch_count(), 4);
}

#[tokio::test]
async fn test_transport_errors_are_kept_apart() {
    let program = Program::load(TICTACTOE_PROGRAM_ID, &tictactoe_idl()).unwrap();
    let client = ProgramClient::new(&program, MemoryAccounts::offline());
    assert!(matches!(
        client.fetch("Game", &GAME).await,
        Err(ClientError::Transport(Offline))
    ));
    assert!(matches!(
        client.fetch_multiple("Game", &[GAME]).await,
        Err(ClientError::Transport(Offline))
    ));
}

#[tokio::test]
async fn test_unknown_account_type_fails_before_fetching() {
    let program = Program::load(TICTACTOE_PROGRAM_ID, &tictactoe_idl()).unwrap();
    let client = ProgramClient::new(&program, MemoryAccounts::new());
    match client.fetch("Lobby", &GAME).await {
        Err(ClientError::Codec(err)) => assert_eq!(err.kind(), ErrorKind::UnknownTypeName),
        other => panic!("expected unknown type, got {other:?}"),
    }
    assert_eq!(client.fetcher().fetch_count(), 0);
}

#[tokio::test]
async fn test_fetch_any_identifies_account_type() {
    let program = Program::load(BASIC_2_PROGRAM_ID, &basic_2_idl()).unwrap();
    let counter = Pubkey::new_unique();
    let data = program
        .account("Counter")
        .unwrap()
        .encode(&Value::structure([
            ("authority", Value::from(PLAYER)),
            ("count", Value::U64(11)),
        ]))
        .unwrap();
    let client = ProgramClient::new(
        &program,
        MemoryAccounts::new().with_account(counter, BASIC_2_PROGRAM_ID, data),
    );

    let (name, decoded) = client.fetch_any(&counter).await.unwrap().unwrap();
    assert_eq!(name, "Counter");
    assert_eq!(decoded.value().field("count"), Some(&Value::U64(11)));
}

#[tokio::test]
async fn test_send_builds_and_submits() {
    let program = Program::load(TICTACTOE_PROGRAM_ID, &tictactoe_idl()).unwrap();
    let client = ProgramClient::new(&program, MemoryAccounts::new());
    let sink = RecordingSink::default();
    let args = Value::structure([(
        "tile",
        Value::structure([("row", Value::U8(0)), ("column", Value::U8(1))]),
    )]);

    let index = client
        .send(
            &sink,
            "play",
            &args,
            &Accounts::new().with("game", GAME).with("player", PLAYER),
            vec![],
            &[PLAYER][..],
        )
        .await
        .unwrap();
    assert_eq!(index, 0);

    let submitted = sink.submitted.lock().unwrap();
    let (ix, signers) = &submitted[0];
    assert_eq!(ix.program_id, TICTACTOE_PROGRAM_ID);
    assert_eq!(&ix.data[8..], &[0, 1]);
    assert_eq!(signers, &[PLAYER]);
}

#[tokio::test]
async fn test_send_rejects_bad_args_without_submitting() {
    let program = Program::load(TICTACTOE_PROGRAM_ID, &tictactoe_idl()).unwrap();
    let client = ProgramClient::new(&program, MemoryAccounts::new());
    let sink = RecordingSink::default();

    let result = client
        .send(
            &sink,
            "play",
            &Value::structure([("tile", Value::U8(0))]),
            &Accounts::new().with("game", GAME).with("player", PLAYER),
            vec![],
            &[PLAYER][..],
        )
        .await;
    assert!(matches!(result, Err(ClientError::Codec(ref err)) if err.kind() == ErrorKind::ArgumentShapeError));
    assert!(sink.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_default_batch_fetch_uses_fetch_one() {
    let fetcher = MemoryAccounts::new().with_account(GAME, TICTACTOE_PROGRAM_ID, vec![1, 2, 3]);
    let accounts = fetcher
        .fetch_multiple_accounts(&[GAME, PLAYER])
        .await
        .unwrap();
    assert_eq!(
        accounts,
        vec![Some(RawAccount::new(TICTACTOE_PROGRAM_ID, vec![1, 2, 3])), None]
    );
}
