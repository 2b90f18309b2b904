use std::fmt;

/// Kind of entity the detail panel can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Track,
    Artist,
    Album,
    Playlist,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Track => "track",
            EntityType::Artist => "artist",
            EntityType::Album => "album",
            EntityType::Playlist => "playlist",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A concrete entity the panel or prefetcher is pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTarget {
    pub entity: EntityType,
    pub id: String,
}

impl EntityTarget {
    pub fn new(entity: EntityType, id: impl Into<String>) -> Self {
        Self {
            entity,
            id: id.into(),
        }
    }

    pub fn track(id: impl Into<String>) -> Self {
        Self::new(EntityType::Track, id)
    }

    pub fn artist(id: impl Into<String>) -> Self {
        Self::new(EntityType::Artist, id)
    }

    pub fn album(id: impl Into<String>) -> Self {
        Self::new(EntityType::Album, id)
    }

    pub fn playlist(id: impl Into<String>) -> Self {
        Self::new(EntityType::Playlist, id)
    }
}

impl fmt::Display for EntityTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_strings() {
        assert_eq!(EntityType::Track.as_str(), "track");
        assert_eq!(EntityType::Artist.as_str(), "artist");
        assert_eq!(EntityType::Album.as_str(), "album");
        assert_eq!(EntityType::Playlist.as_str(), "playlist");
    }

    #[test]
    fn test_target_equality_and_display() {
        let a = EntityTarget::track("t1");
        let b = EntityTarget::new(EntityType::Track, "t1");
        assert_eq!(a, b);
        assert_ne!(a, EntityTarget::album("t1"));
        assert_eq!(a.to_string(), "track:t1");
    }
}
