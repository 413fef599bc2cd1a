use ledgersync_core::migrations::Migration;

/// Index for ledger lookups by currency over time.
pub struct MigrationV3;

impl Migration for MigrationV3 {
    fn version(&self) -> i64 {
        3
    }

    fn up(&self) -> Vec<String> {
        vec![
            "CREATE INDEX ledgers_user_id_currency_mts ON ledgers(user_id, currency, mts)"
                .to_string(),
        ]
    }

    fn down(&self) -> Vec<String> {
        vec!["DROP INDEX ledgers_user_id_currency_mts".to_string()]
    }
}
