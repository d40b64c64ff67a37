//! Schema ownership.
//!
//! The three tables backing the credential store. The DDL is idempotent so
//! `setup` and server boot can both run it; MySQL (8+) is assumed for the
//! JSON columns and fractional timestamps.

use sqlx::MySqlPool;

use crate::error::OAuthError;

const CREATE_CLIENTS: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    id            CHAR(36)     NOT NULL PRIMARY KEY,
    name          VARCHAR(255) NOT NULL,
    secret        CHAR(64)     NULL,
    redirect_uris JSON         NOT NULL,
    scopes        JSON         NULL,
    grant_types   JSON         NOT NULL,
    confidential  BOOLEAN      NOT NULL DEFAULT TRUE,
    first_party   BOOLEAN      NOT NULL DEFAULT FALSE,
    revoked       BOOLEAN      NOT NULL DEFAULT FALSE,
    created_at    TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
    updated_at    TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6)
)
"#;

const CREATE_TOKENS: &str = r#"
CREATE TABLE IF NOT EXISTS tokens (
    id                 CHAR(36)     NOT NULL PRIMARY KEY,
    user_id            VARCHAR(255) NULL,
    client_id          CHAR(36)     NOT NULL,
    name               VARCHAR(255) NULL,
    scopes             JSON         NOT NULL,
    token              CHAR(64)     NOT NULL,
    refresh_token      CHAR(64)     NULL,
    expires_at         TIMESTAMP(6) NOT NULL,
    refresh_expires_at TIMESTAMP(6) NULL DEFAULT NULL,
    last_used_at       TIMESTAMP(6) NULL DEFAULT NULL,
    revoked_at         TIMESTAMP(6) NULL DEFAULT NULL,
    created_at         TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
    UNIQUE KEY tokens_token_unique (token),
    UNIQUE KEY tokens_refresh_token_unique (refresh_token),
    KEY tokens_user_id_index (user_id),
    KEY tokens_client_id_index (client_id),
    CONSTRAINT tokens_client_id_foreign
        FOREIGN KEY (client_id) REFERENCES clients (id) ON DELETE CASCADE
)
"#;

const CREATE_AUTH_CODES: &str = r#"
CREATE TABLE IF NOT EXISTS auth_codes (
    id                    CHAR(36)      NOT NULL PRIMARY KEY,
    client_id             CHAR(36)      NOT NULL,
    user_id               VARCHAR(255)  NOT NULL,
    code                  CHAR(64)      NOT NULL,
    redirect_uri          VARCHAR(2048) NOT NULL,
    scopes                JSON          NOT NULL,
    code_challenge        VARCHAR(128)  NULL,
    code_challenge_method VARCHAR(10)   NULL,
    expires_at            TIMESTAMP(6)  NOT NULL,
    used_at               TIMESTAMP(6)  NULL DEFAULT NULL,
    created_at            TIMESTAMP(6)  NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
    UNIQUE KEY auth_codes_code_unique (code),
    KEY auth_codes_client_id_index (client_id),
    CONSTRAINT auth_codes_client_id_foreign
        FOREIGN KEY (client_id) REFERENCES clients (id) ON DELETE CASCADE
)
"#;

/// Create the clients, tokens, and auth_codes tables if they are absent.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), OAuthError> {
    for ddl in [CREATE_CLIENTS, CREATE_TOKENS, CREATE_AUTH_CODES] {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_is_create_if_absent() {
        for ddl in [CREATE_CLIENTS, CREATE_TOKENS, CREATE_AUTH_CODES] {
            assert!(ddl.contains("CREATE TABLE IF NOT EXISTS"));
        }
    }

    #[test]
    fn token_hashes_are_unique_keys() {
        assert!(CREATE_TOKENS.contains("UNIQUE KEY tokens_token_unique (token)"));
        assert!(CREATE_TOKENS.contains("UNIQUE KEY tokens_refresh_token_unique (refresh_token)"));
        assert!(CREATE_AUTH_CODES.contains("UNIQUE KEY auth_codes_code_unique (code)"));
    }
}
