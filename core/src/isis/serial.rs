//! Matching control-network serial numbers to cube files by spacecraft clock.
//!
//! ISIS serial numbers embed the image's clock count after the instrument
//! prefix (`MRO/CTX/0928283918:060`), so a cube matches a serial when its
//! label's clock count is a substring of that serial.

use crate::io::label::{Label, LabelReader};
use crate::telemetry::LogManager;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const INSTRUMENT_GROUP: [&str; 2] = ["IsisCube", "Instrument"];
const CLOCK_KEYWORDS: [&str; 2] = ["SpacecraftClockCount", "SpacecraftClockStartCount"];

/// Clock identifier of an image, preferring the clock count over the
/// clock start count. Empty values count as absent.
pub fn clock_id(label: &Label) -> Option<String> {
    let instrument = label.group(&INSTRUMENT_GROUP)?;
    CLOCK_KEYWORDS
        .iter()
        .filter_map(|keyword| instrument.keyword(keyword))
        .map(str::trim)
        .find(|clock| !clock.is_empty())
        .map(str::to_string)
}

/// Clock id to cube path, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClockLookup {
    entries: Vec<(String, PathBuf)>,
}

impl ClockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every cube label; unreadable or clockless cubes are skipped.
    pub fn build<P: AsRef<Path>>(paths: &[P], reader: &dyn LabelReader) -> Self {
        let logger = LogManager::new("serial");
        let mut lookup = Self::new();
        for path in paths {
            let path = path.as_ref();
            match reader.read_label(path) {
                Ok(label) => match clock_id(&label) {
                    Some(clock) => lookup.insert(clock, path),
                    None => logger.warn(&format!("no clock count in {}", path.display())),
                },
                Err(err) => logger.warn(&format!("skipping {}: {}", path.display(), err)),
            }
        }
        logger.record(&format!(
            "{} of {} images have clock ids",
            lookup.len(),
            paths.len()
        ));
        lookup
    }

    /// Adds or replaces the path for a clock id.
    pub fn insert(&mut self, clock: impl Into<String>, path: impl Into<PathBuf>) {
        let clock = clock.into();
        let path = path.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == clock) {
            Some(entry) => entry.1 = path,
            None => self.entries.push((clock, path)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, clock: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == clock)
            .map(|(_, path)| path.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(clock, path)| (clock.as_str(), path.as_path()))
    }

    /// Cube whose clock id occurs in `serial`. The first inserted match wins;
    /// ambiguous matches are logged.
    pub fn resolve(&self, serial: &str) -> Option<&Path> {
        let mut matches = self
            .entries
            .iter()
            .filter(|(clock, _)| !clock.is_empty() && serial.contains(clock.as_str()));
        let (clock, path) = matches.next()?;
        let others: Vec<&str> = matches.map(|(other, _)| other.as_str()).collect();
        if !others.is_empty() {
            LogManager::new("serial").warn(&format!(
                "serial {} matches clocks {} and {:?}; using {}",
                serial,
                clock,
                others,
                path.display()
            ));
        }
        Some(path.as_path())
    }

    pub fn match_serials<I, S>(&self, serials: I) -> BTreeMap<String, Option<PathBuf>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        serials
            .into_iter()
            .map(|serial| {
                let serial = serial.as_ref();
                (serial.to_string(), self.resolve(serial).map(Path::to_path_buf))
            })
            .collect()
    }

    /// First serial that embeds the clock id registered for `path`.
    pub fn serial_for_image<'s, S: AsRef<str>>(
        &self,
        path: &Path,
        serials: &'s [S],
    ) -> Option<&'s str> {
        let (clock, _) = self
            .entries
            .iter()
            .find(|(_, candidate)| candidate == path)?;
        serials
            .iter()
            .map(|serial| serial.as_ref())
            .find(|serial| serial.contains(clock.as_str()))
    }
}

pub fn build_lookup<P: AsRef<Path>>(paths: &[P], reader: &dyn LabelReader) -> ClockLookup {
    ClockLookup::build(paths, reader)
}

pub fn match_serials<S: AsRef<str>, P: AsRef<Path>>(
    serials: &[S],
    paths: &[P],
    reader: &dyn LabelReader,
) -> BTreeMap<String, Option<PathBuf>> {
    build_lookup(paths, reader).match_serials(serials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{CnetError, CnetResult};
    use std::collections::HashMap;

    struct StaticLabels(HashMap<PathBuf, String>);

    impl LabelReader for StaticLabels {
        fn read_label(&self, path: &Path) -> CnetResult<Label> {
            let text = self
                .0
                .get(path)
                .ok_or_else(|| CnetError::NotFound(path.to_path_buf()))?;
            Label::parse(text)
        }
    }

    fn instrument(body: &str) -> String {
        format!(
            "Object = IsisCube\n  Group = Instrument\n{}\n  End_Group\nEnd_Object\nEnd\n",
            body
        )
    }

    fn labels() -> StaticLabels {
        let mut map = HashMap::new();
        map.insert(
            PathBuf::from("a.cub"),
            instrument("SpacecraftClockCount = 0928283918:060"),
        );
        map.insert(
            PathBuf::from("b.cub"),
            instrument("SpacecraftClockStartCount = \"0928284005:112\""),
        );
        map.insert(PathBuf::from("c.cub"), instrument("InstrumentId = CTX"));
        StaticLabels(map)
    }

    #[test]
    fn clock_count_preferred_over_start_count() {
        let label = Label::parse(&instrument(
            "SpacecraftClockStartCount = 111\nSpacecraftClockCount = 222",
        ))
        .unwrap();
        assert_eq!(clock_id(&label).as_deref(), Some("222"));

        let label = Label::parse(&instrument(
            "SpacecraftClockCount = \"\"\nSpacecraftClockStartCount = 111",
        ))
        .unwrap();
        assert_eq!(clock_id(&label).as_deref(), Some("111"));
    }

    #[test]
    fn build_skips_unreadable_and_clockless_images() {
        let paths = ["a.cub", "b.cub", "c.cub", "missing.cub"].map(PathBuf::from);
        let lookup = build_lookup(&paths, &labels());
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get("0928283918:060"), Some(Path::new("a.cub")));
        assert_eq!(lookup.get("0928284005:112"), Some(Path::new("b.cub")));
    }

    #[test]
    fn serials_resolve_by_embedded_clock() {
        let paths = ["a.cub", "b.cub"].map(PathBuf::from);
        let serials = ["MRO/CTX/0928283918:060", "MRO/CTX/0928284005:112", "MRO/CTX/1:1"];
        let matched = match_serials(&serials, &paths, &labels());
        assert_eq!(matched["MRO/CTX/0928283918:060"], Some(PathBuf::from("a.cub")));
        assert_eq!(matched["MRO/CTX/0928284005:112"], Some(PathBuf::from("b.cub")));
        assert_eq!(matched["MRO/CTX/1:1"], None);
    }

    #[test]
    fn ambiguous_match_keeps_first_inserted() {
        let mut lookup = ClockLookup::new();
        lookup.insert("12345", "long.cub");
        lookup.insert("123", "short.cub");
        assert_eq!(lookup.resolve("SC/12345"), Some(Path::new("long.cub")));
        assert_eq!(lookup.resolve("SC/1239"), Some(Path::new("short.cub")));
    }

    #[test]
    fn serial_for_image_finds_embedding_serial() {
        let mut lookup = ClockLookup::new();
        lookup.insert("0928283918:060", "a.cub");
        let serials = vec![
            "MRO/CTX/0928284005:112".to_string(),
            "MRO/CTX/0928283918:060".to_string(),
        ];
        assert_eq!(
            lookup.serial_for_image(Path::new("a.cub"), &serials[..]),
            Some("MRO/CTX/0928283918:060")
        );
        assert_eq!(lookup.serial_for_image(Path::new("b.cub"), &serials[..]), None);
    }
}
