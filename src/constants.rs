/// Security questions offered at registration. The stored `question` column
/// holds the text itself, not an index.
pub const QUESTIONS: &[&str] = &[
    "What was the make of your first car?",
    "What is your mother's maiden name?",
    "What was the name of your first pet?",
    "In what city were you born?",
    "What is your favorite movie?",
];

/// Placeholder served whenever an account's notes column is empty.
pub const DEFAULT_NOTE: &str =
    "This is a private notes area. Anything typed here is saved to your account.";

/// Default XOR obfuscation key. Overridable via `[security] pw_enc_key` in
/// config.toml; the migration seed and the config default must agree.
pub const DEFAULT_ENC_KEY: &str = "sekrit";

pub mod seed {

    pub const ADMIN_USERNAME: &str = "admin";

    pub const ADMIN_PASSWORD: &str = "BreachAdmin1";
}

pub mod limits {

    /// Slots on the snake high-score board.
    pub const HIGH_SCORE_SLOTS: u64 = 10;
}
