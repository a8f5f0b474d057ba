use serde::{Deserialize, Deserializer, Serialize};

/// Episode record as served by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawEpisode {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub members: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub description: Option<String>,
    pub published_at: String,
    pub file: RawEpisodeFile,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawEpisodeFile {
    pub url: String,
    // Some exports ship the duration as a string, others as a float
    #[serde(deserialize_with = "whole_seconds")]
    pub duration: u64,
}

/// Query parameters for the episode listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodesQuery {
    pub limit: usize,
}

impl EpisodesQuery {
    pub fn latest(limit: usize) -> Self {
        Self { limit }
    }

    pub fn to_query_string(&self) -> String {
        format!("_limit={}&_sort=published_at&_order=desc", self.limit)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Text(s) => s,
        StringOrNumber::Integer(n) => n.to_string(),
        StringOrNumber::Float(f) => f.to_string(),
    })
}

fn whole_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let seconds = match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Integer(n) => n as f64,
        StringOrNumber::Float(f) => f,
        StringOrNumber::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("duration '{}' is not a number", s)))?,
    };

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(D::Error::custom(format!("duration {} is out of range", seconds)));
    }

    Ok(seconds.trunc() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_json_server_record() {
        let json = r#"{
            "id": "a-importancia-da-contribuicao-em-open-source",
            "title": "Faladev #30 | A importância da contribuição em Open Source",
            "members": "Diego Fernandes, João Pedro, Diego Haz e Bruno Lemos",
            "published_at": "2021-01-22 16:00:00",
            "thumbnail": "https://example.com/opensource.jpg",
            "description": "<p>Nesse episódio do Faladev...</p>",
            "file": {
                "url": "https://example.com/opensource.m4a",
                "type": "audio/x-m4a",
                "duration": 3981
            }
        }"#;

        let raw: RawEpisode = serde_json::from_str(json).unwrap();
        assert_eq!(raw.id, "a-importancia-da-contribuicao-em-open-source");
        assert_eq!(raw.file.duration, 3981);
        assert_eq!(raw.description.as_deref(), Some("<p>Nesse episódio do Faladev...</p>"));
    }

    #[test]
    fn accepts_numeric_id_and_string_duration() {
        let json = r#"{
            "id": 7,
            "title": "Numbers",
            "published_at": "2021-01-22",
            "file": { "url": "https://example.com/7.mp3", "duration": "61.9" }
        }"#;

        let raw: RawEpisode = serde_json::from_str(json).unwrap();
        assert_eq!(raw.id, "7");
        assert_eq!(raw.file.duration, 61);
        assert_eq!(raw.members, "");
        assert!(raw.description.is_none());
    }

    #[test]
    fn rejects_negative_or_garbage_duration() {
        let negative = r#"{"id":"x","title":"t","published_at":"2021-01-22",
            "file":{"url":"u","duration":-3}}"#;
        let garbage = r#"{"id":"x","title":"t","published_at":"2021-01-22",
            "file":{"url":"u","duration":"long"}}"#;

        assert!(serde_json::from_str::<RawEpisode>(negative).is_err());
        assert!(serde_json::from_str::<RawEpisode>(garbage).is_err());
    }

    #[test]
    fn listing_query_sorts_newest_first() {
        assert_eq!(
            EpisodesQuery::latest(12).to_query_string(),
            "_limit=12&_sort=published_at&_order=desc"
        );
    }
}
