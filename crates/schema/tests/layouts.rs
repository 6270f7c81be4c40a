//! Declarations written in the schema language, allocated end to end.

use slotscope_core::{AccessPath, Address, U256};
use slotscope_layout::StorageLayout;
use slotscope_schema::{parse_declaration, parse_path, parse_value};
use slotscope_storage::MemoryStore;

const TOKEN: &str = r#"
    contract Token {
        mapping(address => uint256) balances;
        mapping(address => mapping(address => uint256)) allowances;
        uint256 totalSupply;
        string name;
        string symbol;
        uint8 decimals;
        address public owner;
        bool paused;
        Checkpoint[] checkpoints;

        struct Checkpoint {
            uint32 fromBlock;
            uint224 votes;
        }
    }
"#;

#[test]
fn test_token_layout() {
    let declaration = parse_declaration(TOKEN).unwrap();
    let layout = StorageLayout::keccak(&declaration).unwrap();
    let entries = layout.assignment().entries();

    let row = |path: &str| {
        entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| (e.slot, e.offset, e.width))
            .unwrap()
    };

    assert_eq!(row("balances"), (U256::from(0), 0, 32));
    assert_eq!(row("allowances"), (U256::from(1), 0, 32));
    assert_eq!(row("totalSupply"), (U256::from(2), 0, 32));
    assert_eq!(row("symbol"), (U256::from(4), 0, 32));
    assert_eq!(row("decimals"), (U256::from(5), 0, 1));
    assert_eq!(row("owner"), (U256::from(5), 1, 20));
    assert_eq!(row("paused"), (U256::from(5), 21, 1));
    assert_eq!(row("checkpoints"), (U256::from(6), 0, 32));
    assert_eq!(layout.assignment().slot_count(), 7);
}

#[test]
fn test_literals_drive_reads_and_writes() {
    let declaration = parse_declaration(TOKEN).unwrap();
    let layout = StorageLayout::keccak(&declaration).unwrap();
    let store = MemoryStore::new();

    let allowances = declaration.get("allowances").unwrap();
    let owner = "0x00000000000000000000000000000000000000a1";
    let spender = "0x00000000000000000000000000000000000000b2";
    let path = parse_path(allowances, &format!("{{{}}}{{{}}}", owner, spender)).unwrap();
    assert_eq!(
        path,
        AccessPath::new()
            .key(Address::with_last_byte(0xa1))
            .key(Address::with_last_byte(0xb2))
    );

    let amount = parse_value(&slotscope_core::TypeDescriptor::uint256(), "1000").unwrap();
    layout
        .write_value(&store, "allowances", &path, &amount)
        .unwrap();
    assert_eq!(
        layout.read_value(&store, "allowances", &path).unwrap(),
        amount
    );

    let checkpoints = declaration.get("checkpoints").unwrap();
    let history = parse_value(
        checkpoints,
        r#"[{"fromBlock": 10, "votes": 500}, {"fromBlock": 12, "votes": "0x0400"}]"#,
    )
    .unwrap();
    layout
        .write_value(&store, "checkpoints", &AccessPath::new(), &history)
        .unwrap();

    let votes = parse_path(checkpoints, "[1].votes").unwrap();
    assert_eq!(
        layout.read_value(&store, "checkpoints", &votes).unwrap(),
        slotscope_core::Value::uint(1024)
    );
    // Each checkpoint packs into a single slot
    let first = layout
        .resolve("checkpoints", &parse_path(checkpoints, "[0].votes").unwrap())
        .unwrap();
    let second = layout.resolve("checkpoints", &votes).unwrap();
    assert_eq!(second.slot, first.slot + U256::from(1));
    assert_eq!(second.offset, 4);
}
