//! Recording metadata encoded in file names
//!
//! Files are named `PersonID_MusicID_SegmentID_RepetitionID[_MetaID].ext`.
//! The first character of the person id is the singer's gender tag.

use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// File name without its extension
    pub key: String,
    pub gender: String,
    pub person_id: String,
    pub music_id: String,
    pub segment_id: String,
    pub repetition_id: String,
    pub meta_id: String,
}

impl FileInfo {
    /// Split a file name into its fields.
    ///
    /// Missing fields are left empty; anything after the fifth part is kept
    /// in `meta_id`. Names are never rejected.
    pub fn from_file_name(name: &str) -> Self {
        let key = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name)
            .to_string();

        let mut parts = key.splitn(5, '_').map(str::to_string);
        let person_id = parts.next().unwrap_or_default();
        let gender = person_id.chars().next().map(String::from).unwrap_or_default();

        FileInfo {
            gender,
            person_id,
            music_id: parts.next().unwrap_or_default(),
            segment_id: parts.next().unwrap_or_default(),
            repetition_id: parts.next().unwrap_or_default(),
            meta_id: parts.next().unwrap_or_default(),
            key,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        Self::from_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_four_parts() {
        let info = FileInfo::from_file_name("F03_M12_S2_R1.mid");
        assert_eq!(info.key, "F03_M12_S2_R1");
        assert_eq!(info.gender, "F");
        assert_eq!(info.person_id, "F03");
        assert_eq!(info.music_id, "M12");
        assert_eq!(info.segment_id, "S2");
        assert_eq!(info.repetition_id, "R1");
        assert_eq!(info.meta_id, "");
    }

    #[test]
    fn test_five_parts() {
        let info = FileInfo::from_file_name("M07_M01_S1_R3_hum.wav");
        assert_eq!(info.gender, "M");
        assert_eq!(info.meta_id, "hum");
    }

    #[test]
    fn test_extra_parts_stay_in_meta() {
        let info = FileInfo::from_file_name("M07_M01_S1_R3_hum_take_2.wav");
        assert_eq!(info.repetition_id, "R3");
        assert_eq!(info.meta_id, "hum_take_2");
    }

    #[test]
    fn test_short_names_are_not_rejected() {
        let info = FileInfo::from_file_name("melody.mid");
        assert_eq!(info.key, "melody");
        assert_eq!(info.person_id, "melody");
        assert_eq!(info.gender, "m");
        assert_eq!(info.music_id, "");
        assert_eq!(info.meta_id, "");
    }

    #[test]
    fn test_from_path_uses_file_name() {
        let info = FileInfo::from_path(Path::new("data/midi/F01_M02_S3_R4.mid"));
        assert_eq!(info.key, "F01_M02_S3_R4");
    }

    proptest! {
        #[test]
        fn any_name_is_accepted(name in "\\PC{0,40}") {
            let info = FileInfo::from_file_name(&name);
            prop_assert!(name.contains(info.key.as_str()));
            prop_assert_eq!(info.gender, info.person_id.chars().next().map(String::from).unwrap_or_default());
        }

        #[test]
        fn fields_rejoin_to_key(parts in prop::collection::vec("[A-Za-z0-9]{1,6}", 1..9)) {
            let key = parts.join("_");
            let info = FileInfo::from_file_name(&format!("{}.wav", key));
            let fields = [
                &info.person_id,
                &info.music_id,
                &info.segment_id,
                &info.repetition_id,
                &info.meta_id,
            ];
            let rejoined: Vec<&str> = fields
                .iter()
                .filter(|f| !f.is_empty())
                .map(|f| f.as_str())
                .collect();
            prop_assert_eq!(rejoined.join("_"), key.clone());
            prop_assert_eq!(info.key, key);
        }
    }
}
