use serde_derive::{Deserialize, Serialize};

/// Configuration of the external authenticator process.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AuthenticatorConfig {
    /// Program to run for every credential creation or assertion.
    pub program: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
}
