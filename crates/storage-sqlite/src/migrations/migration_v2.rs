use async_trait::async_trait;
use ledgersync_core::dao::DbDao;
use ledgersync_core::migrations::Migration;
use ledgersync_core::Result;

/// Adds `payInvoiceList`.
///
/// Foreign keys are off while the batch runs and back on afterwards.
pub struct MigrationV2;

#[async_trait]
impl Migration for MigrationV2 {
    fn version(&self) -> i64 {
        2
    }

    async fn before(&self, dao: &dyn DbDao) -> Result<()> {
        dao.disable_foreign_keys().await
    }

    fn up(&self) -> Vec<String> {
        [
            "CREATE TABLE payInvoiceList (
                _id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
                id VARCHAR(255),
                t BIGINT,
                duration INT,
                amount DECIMAL(22,12),
                currency VARCHAR(255),
                orderId VARCHAR(255),
                payCurrencies TEXT,
                webhook VARCHAR(255),
                redirectUrl VARCHAR(255),
                status VARCHAR(255),
                customerInfo TEXT,
                invoices TEXT,
                merchantName VARCHAR(255),
                subUserId INT,
                user_id INT NOT NULL,
                CONSTRAINT payInvoiceList_fk_user_id
                    FOREIGN KEY(user_id)
                    REFERENCES users(_id)
                    ON UPDATE CASCADE
                    ON DELETE CASCADE,
                CONSTRAINT payInvoiceList_fk_subUserId
                    FOREIGN KEY(subUserId)
                    REFERENCES users(_id)
                    ON UPDATE CASCADE
                    ON DELETE CASCADE
            )",
            "CREATE UNIQUE INDEX payInvoiceList_id_user_id
                ON payInvoiceList(id, user_id)",
            "CREATE INDEX payInvoiceList_user_id_currency_t
                ON payInvoiceList(user_id, currency, t)",
            "CREATE INDEX payInvoiceList_user_id_t
                ON payInvoiceList(user_id, t)",
            "CREATE INDEX payInvoiceList_user_id_subUserId_t
                ON payInvoiceList(user_id, subUserId, t)
                WHERE subUserId IS NOT NULL",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn down(&self) -> Vec<String> {
        [
            "DROP TABLE payInvoiceList",
            "DELETE FROM completedOnFirstSyncColls
                WHERE collName = '_getPayInvoiceList'",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    async fn after(&self, dao: &dyn DbDao) -> Result<()> {
        dao.enable_foreign_keys().await
    }
}
