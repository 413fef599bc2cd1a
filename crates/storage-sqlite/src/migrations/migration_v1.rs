use ledgersync_core::migrations::Migration;

/// Base schema: users, the scheduler flag, first-sync markers and ledgers.
pub struct MigrationV1;

impl Migration for MigrationV1 {
    fn version(&self) -> i64 {
        1
    }

    fn up(&self) -> Vec<String> {
        [
            "CREATE TABLE users (
                _id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
                id BIGINT,
                email VARCHAR(255),
                apiKey VARCHAR(255),
                apiSecret VARCHAR(255),
                active INT,
                isDataFromDb INT,
                timezone VARCHAR(255),
                username VARCHAR(255)
            )",
            "CREATE UNIQUE INDEX users_email_username ON users(email, username)",
            "CREATE TABLE scheduler (
                _id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
                isEnable INT
            )",
            "CREATE TABLE completedOnFirstSyncColls (
                _id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
                collName VARCHAR(255) NOT NULL,
                mts BIGINT,
                subUserId INT,
                user_id INT NOT NULL,
                CONSTRAINT completedOnFirstSyncColls_fk_user_id
                    FOREIGN KEY(user_id)
                    REFERENCES users(_id)
                    ON UPDATE CASCADE
                    ON DELETE CASCADE
            )",
            "CREATE UNIQUE INDEX completedOnFirstSyncColls_collName_user_id
                ON completedOnFirstSyncColls(collName, user_id)",
            "CREATE TABLE ledgers (
                _id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
                id BIGINT,
                currency VARCHAR(255),
                mts BIGINT,
                amount DECIMAL(22,12),
                balance DECIMAL(22,12),
                description TEXT,
                wallet VARCHAR(255),
                subUserId INT,
                user_id INT NOT NULL,
                CONSTRAINT ledgers_fk_user_id
                    FOREIGN KEY(user_id)
                    REFERENCES users(_id)
                    ON UPDATE CASCADE
                    ON DELETE CASCADE,
                CONSTRAINT ledgers_fk_subUserId
                    FOREIGN KEY(subUserId)
                    REFERENCES users(_id)
                    ON UPDATE CASCADE
                    ON DELETE CASCADE
            )",
            "CREATE UNIQUE INDEX ledgers_id_user_id ON ledgers(id, user_id)",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn down(&self) -> Vec<String> {
        [
            "DROP TABLE ledgers",
            "DROP TABLE completedOnFirstSyncColls",
            "DROP TABLE scheduler",
            "DROP TABLE users",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
}
