//! Deep links into the chat client.

/// Label of the static tab listing a hiring manager's positions.
pub const POTENTIAL_CANDIDATES_TAB_LABEL: &str = "Potential candidates";

/// Build a link that opens a static tab of the bot's app.
pub fn entity_deep_link(app_id: &str, entity_id: &str, label: &str) -> String {
    format!(
        "https://teams.microsoft.com/l/entity/{}/{}?label={}",
        urlencoding::encode(app_id),
        urlencoding::encode(entity_id),
        urlencoding::encode(label)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_deep_link_encodes_label() {
        let link = entity_deep_link("app-1", "OpenPositionsTab", POTENTIAL_CANDIDATES_TAB_LABEL);
        assert_eq!(
            link,
            "https://teams.microsoft.com/l/entity/app-1/OpenPositionsTab?label=Potential%20candidates"
        );
    }
}
