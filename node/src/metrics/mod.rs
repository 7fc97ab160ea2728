//! Structured metrics, written as JSON lines to the `metrics` log target so
//! any log collector can pick them up without a metrics server.

use primitive_types::U256;

/// Emitted once per successfully mined and connected block.
pub(crate) fn mined_block(difficulty: U256, sequence: u64) {
    //difficulty saturates at u64::MAX to stay a JSON integer
    let difficulty = difficulty.min(U256::from(u64::MAX)).as_u64();
    let record = serde_json::json!({
        "name": "minedBlock",
        "fields": {
            "difficulty": difficulty,
            "sequence": sequence,
        },
    });
    log::info!(target: "metrics", "{record}");
}
