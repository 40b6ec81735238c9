/// Text Rendering of Civic Requests

use super::CivicRequest;

/// Line placed between two rendered requests.
pub const SEPARATOR: &str = "\n---\n";

/// Render one request as a fixed five-line block.
///
/// Absent or empty fields are replaced by a per-field placeholder so every
/// block always carries all five labels.
pub fn format_request(request: &CivicRequest) -> String {
    fn or<'a>(field: &'a Option<String>, placeholder: &'a str) -> &'a str {
        field.as_deref().filter(|s| !s.is_empty()).unwrap_or(placeholder)
    }

    format!(
        "\n        Description: {}\n        Status: {}\n        Address: {}\n        Service: {}\n        Last Updated: {}\n        ",
        or(&request.description, "No description available"),
        or(&request.status, "No status provided"),
        or(&request.address, "No address provided"),
        or(&request.service_name, "No service provided"),
        or(&request.updated_datetime, "No updates yet"),
    )
}

/// Render every request and join the blocks with [`SEPARATOR`].
/// An empty batch renders as the empty string.
pub fn format_requests(requests: &[CivicRequest]) -> String {
    requests
        .iter()
        .map(format_request)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: [&str; 5] = [
        "Description: ",
        "Status: ",
        "Address: ",
        "Service: ",
        "Last Updated: ",
    ];

    fn request(description: &str, status: &str) -> CivicRequest {
        CivicRequest {
            description: Some(description.to_string()),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn pothole_renders_with_placeholders() {
        assert_eq!(
            format_request(&request("Pothole", "open")),
            "\n        Description: Pothole\n        Status: open\n        Address: No address provided\n        Service: No service provided\n        Last Updated: No updates yet\n        "
        );
    }

    #[test]
    fn empty_strings_use_placeholders() {
        let block = format_request(&CivicRequest {
            description: Some(String::new()),
            status: Some(String::new()),
            address: Some(String::new()),
            service_name: Some(String::new()),
            updated_datetime: Some(String::new()),
        });
        assert!(block.contains("Description: No description available\n"));
        assert!(block.contains("Status: No status provided\n"));
        assert!(block.contains("Address: No address provided\n"));
        assert!(block.contains("Service: No service provided\n"));
        assert!(block.contains("Last Updated: No updates yet\n"));
    }

    #[test]
    fn full_record_uses_every_field() {
        let block = format_request(&CivicRequest {
            description: Some("Streetlight out".into()),
            status: Some("closed".into()),
            address: Some("1 Church St".into()),
            service_name: Some("Street Lights".into()),
            updated_datetime: Some("2024-03-01T12:00:00-05:00".into()),
        });
        assert!(block.contains("Address: 1 Church St\n"));
        assert!(block.contains("Service: Street Lights\n"));
        assert!(block.contains("Last Updated: 2024-03-01T12:00:00-05:00\n"));
        assert!(!block.contains("No "));
    }

    #[test]
    fn batch_has_one_block_per_request() {
        let requests = vec![
            request("Pothole", "open"),
            CivicRequest::default(),
            request("Graffiti", "acknowledged"),
        ];
        let text = format_requests(&requests);
        let blocks: Vec<&str> = text.split(SEPARATOR).collect();

        assert_eq!(blocks.len(), 3);
        assert_eq!(text.matches("\n---\n").count(), 2);
        for block in &blocks {
            for label in LABELS {
                assert_eq!(block.matches(label).count(), 1, "{label} in {block:?}");
            }
        }
        // the empty record only affects its own block
        assert!(blocks[1].contains("No description available"));
        assert!(blocks[0].contains("Description: Pothole"));
        assert!(blocks[2].contains("Description: Graffiti"));
    }

    #[test]
    fn empty_batch_is_empty_text() {
        assert_eq!(format_requests(&[]), "");
    }
}
