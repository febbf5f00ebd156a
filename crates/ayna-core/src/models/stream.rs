use serde::Deserialize;

/// Response of `GET /api/player/streams`; the playable URL lives at
/// `content[0].src.url`.
#[derive(Debug, Deserialize)]
pub struct StreamsResponse {
    #[serde(default)]
    content: Vec<StreamContent>,
}

#[derive(Debug, Deserialize)]
struct StreamContent {
    src: Option<StreamSrc>,
}

#[derive(Debug, Deserialize)]
struct StreamSrc {
    url: Option<String>,
}

impl StreamsResponse {
    /// First stream URL, if the response carries one
    pub fn first_url(&self) -> Option<&str> {
        self.content
            .first()
            .and_then(|c| c.src.as_ref())
            .and_then(|s| s.url.as_deref())
            .filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_url() {
        let json = r#"{"content":[
            {"src":{"url":"https://cdn.example/live.m3u8","type":"hls"}},
            {"src":{"url":"https://cdn.example/backup.m3u8"}}
        ]}"#;
        let parsed: StreamsResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(parsed.first_url(), Some("https://cdn.example/live.m3u8"));
    }

    #[test]
    fn test_empty_content_has_no_url() {
        let cases = [
            r#"{}"#,
            r#"{"content":[]}"#,
            r#"{"content":[{}]}"#,
            r#"{"content":[{"src":{"url":""}}]}"#,
        ];
        for json in cases {
            let parsed: StreamsResponse = serde_json::from_str(json).expect("parse");
            assert_eq!(parsed.first_url(), None, "{json}");
        }
    }
}
