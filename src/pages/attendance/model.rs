use super::*;

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct CheckPayload {
    #[serde(default)]
    pub(super) method: Option<CheckMethod>,
}

impl CheckPayload {
    pub(super) fn method(&self) -> CheckMethod {
        self.method.unwrap_or_default()
    }
}
