use chrono::{DateTime, Utc};
use registry_tree::field::FrHex;
use registry_tree::reader::GroupSummary;
use registry_tree::types::GroupDefinition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistryRootRequest {
    /// Groups to commit to, in the same shape as `customGroups` of an app config.
    pub groups: Vec<GroupDefinition>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistryRootResponse {
    pub registry_tree_root: FrHex,
    pub groups: Vec<GroupSummary>,

    /// Set for the cached registry of the loaded configuration.
    pub computed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountsTreeResponse {
    pub group_id: String,
    pub group_timestamp: String,
    pub snapshot_id: FrHex,
    pub accounts_tree_root: FrHex,
    pub height: usize,
    pub leaves: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_request_accepts_client_group_shape() {
        let req: RegistryRootRequest = serde_json::from_str(
            r#"{"groups":[{"groupId":"0x01","groupTimestamp":"latest","data":{"0x02":3}}]}"#,
        )
        .unwrap();
        assert_eq!(req.groups.len(), 1);
        assert_eq!(req.groups[0].group_id, "0x01");
    }
}
