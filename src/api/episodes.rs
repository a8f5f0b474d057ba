use chrono::Locale;
use serde::{Deserialize, Serialize};

use super::RawEpisode;
use crate::error::ApiError;
use crate::helpers::{format_duration, format_published_at, parse_published_at};

/// Display-ready episode, built once by [`map_episode`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub members: String,
    pub url: String,
    pub duration: u64,
    pub duration_as_string: String,
    pub published_at: String,
    pub description: Option<String>,
}

impl Episode {
    /// Identity used to decide whether the player must load a new track.
    pub fn same_track(&self, other: &Episode) -> bool {
        self.id == other.id && self.url == other.url
    }
}

/// Maps a raw API record into its display form.
pub fn map_episode(raw: RawEpisode, locale: Locale) -> Result<Episode, ApiError> {
    let published_at = parse_published_at(&raw.published_at).ok_or_else(|| ApiError::InvalidDate {
        id: raw.id.clone(),
        value: raw.published_at.clone(),
    })?;

    Ok(Episode {
        published_at: format_published_at(published_at, locale),
        duration: raw.file.duration,
        duration_as_string: format_duration(raw.file.duration),
        url: raw.file.url,
        id: raw.id,
        title: raw.title,
        thumbnail: raw.thumbnail,
        members: raw.members,
        description: raw.description,
    })
}

/// Maps a listing, dropping records whose date cannot be read.
pub fn map_episodes(raws: Vec<RawEpisode>, locale: Locale) -> Vec<Episode> {
    raws.into_iter()
        .filter_map(|raw| match map_episode(raw, locale) {
            Ok(episode) => Some(episode),
            Err(e) => {
                log::warn!("Skipping episode: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::RawEpisodeFile;

    pub(crate) fn raw(id: &str, duration: u64, published_at: &str) -> RawEpisode {
        RawEpisode {
            id: id.to_string(),
            title: format!("Episode {}", id),
            members: "Diego e Richard".to_string(),
            thumbnail: format!("https://example.com/{}.jpg", id),
            description: Some("<p>About things</p>".to_string()),
            published_at: published_at.to_string(),
            file: RawEpisodeFile {
                url: format!("https://example.com/{}.m4a", id),
                duration,
            },
        }
    }

    pub(crate) fn episode(id: &str) -> Episode {
        map_episode(raw(id, 61, "2021-01-08 16:00:00"), Locale::en_US).unwrap()
    }

    #[test]
    fn maps_duration_and_date() {
        let episode = map_episode(raw("ep", 61, "2021-01-08T16:00:00Z"), Locale::en_US).unwrap();

        assert_eq!(episode.duration, 61);
        assert_eq!(episode.duration_as_string, "00:01:01");
        assert_eq!(episode.published_at, "8 Jan 21");
        assert!(!episode.published_at.is_empty());
        assert_eq!(episode.url, "https://example.com/ep.m4a");
        assert_eq!(episode.members, "Diego e Richard");
        assert_eq!(episode.description.as_deref(), Some("<p>About things</p>"));
    }

    #[test]
    fn unreadable_date_is_a_structured_error() {
        let err = map_episode(raw("bad", 10, "yesterday"), Locale::en_US).unwrap_err();
        assert!(matches!(err, ApiError::InvalidDate { ref id, .. } if id == "bad"));
    }

    #[test]
    fn listing_skips_unreadable_records() {
        let episodes = map_episodes(
            vec![
                raw("a", 1, "2021-01-08"),
                raw("b", 2, "not a date"),
                raw("c", 3, "2021-01-09"),
            ],
            Locale::en_US,
        );

        let ids: Vec<&str> = episodes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn same_track_compares_id_and_url() {
        let a = episode("a");
        let mut moved = a.clone();
        assert!(a.same_track(&moved));

        moved.url = "https://cdn.example.com/a.m4a".to_string();
        assert!(!a.same_track(&moved));
    }
}
