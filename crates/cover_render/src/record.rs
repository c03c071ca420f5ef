use image::Rgb;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

const DEFAULT_ARTIST: &str = "UNKNOWN ARTIST";
const DEFAULT_TITLE: &str = "GREATEST HITS";
const MAX_ARTIST_WORDS: usize = 3;
const MAX_BADGES: usize = 2;

/// Words dropped first when an artist name has to be shortened.
const FILLER_WORDS: &[&str] = &["THE", "A", "AN", "&", "AND", "OF", "+"];

/// Trait record produced by the questionnaire.
///
/// Every field is optional; empty strings are treated the same as missing ones.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PetRecord {
    pub artist_name: String,
    pub album_title: String,
    pub vibe: String,
    pub energy: String,
    pub liner_notes: String,
    pub wingman_activity: String,
    pub vocalness: String,
    pub sneakiness: String,
}

impl PetRecord {
    /// Upper-cased artist name limited to three significant words.
    pub fn display_artist(&self) -> String {
        let name = self.artist_name.trim();
        if name.is_empty() {
            return DEFAULT_ARTIST.to_owned();
        }
        trim_artist_words(&name.to_uppercase())
    }

    pub fn display_title(&self) -> String {
        let title = self.album_title.trim();
        if title.is_empty() {
            DEFAULT_TITLE.to_owned()
        } else {
            title.to_uppercase()
        }
    }

    pub fn vibe(&self) -> Vibe {
        Vibe::parse(&self.vibe)
    }

    pub fn energy(&self) -> Energy {
        Energy::parse(&self.energy)
    }

    pub fn liner_notes(&self) -> Option<&str> {
        let notes = self.liner_notes.trim();
        (!notes.is_empty()).then_some(notes)
    }

    /// Badge texts in priority order, at most two.
    pub fn badges<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let candidates = [
            Sneakiness::parse(&self.sneakiness).and_then(Sneakiness::badge_phrases),
            Vocalness::parse(&self.vocalness).and_then(Vocalness::badge_phrases),
            WingmanActivity::parse(&self.wingman_activity).map(WingmanActivity::badge_phrases),
        ];

        candidates
            .into_iter()
            .flatten()
            .filter_map(|phrases| phrases.choose(&mut *rng).map(|phrase| (*phrase).to_owned()))
            .take(MAX_BADGES)
            .collect()
    }
}

/// Only significant words count toward the limit; fillers go once it is exceeded.
fn trim_artist_words(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let significant: Vec<&str> =
        words.iter().copied().filter(|word| !FILLER_WORDS.contains(word)).collect();

    let kept: Vec<&str> = match significant.len() {
        0 => words.into_iter().take(MAX_ARTIST_WORDS).collect(),
        count if count <= MAX_ARTIST_WORDS => words,
        _ => significant.into_iter().take(MAX_ARTIST_WORDS).collect(),
    };
    kept.join(" ")
}

fn normalize_key(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vibe {
    Regal,
    Goofball,
    Adventurer,
    Snuggler,
    Bossy,
    WiseSage,
    Neutral,
}

impl Vibe {
    pub fn parse(value: &str) -> Self {
        match normalize_key(value).as_str() {
            "regal" => Vibe::Regal,
            "goofball" => Vibe::Goofball,
            "adventurer" => Vibe::Adventurer,
            "snuggler" => Vibe::Snuggler,
            "bossy" => Vibe::Bossy,
            "wisesage" | "sage" => Vibe::WiseSage,
            _ => Vibe::Neutral,
        }
    }

    /// Solid colour used in place of a missing photo.
    pub fn fallback_color(self) -> Rgb<u8> {
        match self {
            Vibe::Regal => Rgb([92, 48, 120]),
            Vibe::Goofball => Rgb([240, 148, 60]),
            Vibe::Adventurer => Rgb([70, 120, 80]),
            Vibe::Snuggler => Rgb([214, 150, 160]),
            Vibe::Bossy => Rgb([170, 40, 45]),
            Vibe::WiseSage => Rgb([60, 90, 120]),
            Vibe::Neutral => Rgb([150, 135, 120]),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Energy {
    Chill,
    Balanced,
    Zoomies,
}

impl Energy {
    pub fn parse(value: &str) -> Self {
        match normalize_key(value).as_str() {
            "chill" => Energy::Chill,
            "zoomies" | "zoomieseveryhour" => Energy::Zoomies,
            _ => Energy::Balanced,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sneakiness {
    LawAbiding,
    OccasionalHeist,
    MasterThief,
}

impl Sneakiness {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize_key(value).as_str() {
            "lawabiding" => Some(Sneakiness::LawAbiding),
            "occasionalheist" => Some(Sneakiness::OccasionalHeist),
            "masterthief" => Some(Sneakiness::MasterThief),
            _ => None,
        }
    }

    fn badge_phrases(self) -> Option<&'static [&'static str]> {
        match self {
            Sneakiness::LawAbiding => None,
            Sneakiness::OccasionalHeist => Some(&["CONTAINS MINOR CAPERS", "SNEAK PEEK INSIDE"]),
            Sneakiness::MasterThief => {
                Some(&["HIDDEN BONUS: THE HEIST", "INCLUDES SECRET TRACK"])
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vocalness {
    SilentFilmStar,
    Chatty,
    Opera,
}

impl Vocalness {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize_key(value).as_str() {
            "silentfilmstar" | "silent" => Some(Vocalness::SilentFilmStar),
            "chatty" => Some(Vocalness::Chatty),
            "opera" => Some(Vocalness::Opera),
            _ => None,
        }
    }

    fn badge_phrases(self) -> Option<&'static [&'static str]> {
        match self {
            Vocalness::SilentFilmStar => None,
            Vocalness::Chatty => Some(&["EXPLICIT CHATTER", "UNCUT COMMENTARY"]),
            Vocalness::Opera => Some(&["FEATURING VOCAL SOLO", "LIVE ARIA INSIDE"]),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WingmanActivity {
    PeopleWatching,
    ParkMeetups,
    SupervisingFromADistance,
}

impl WingmanActivity {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize_key(value).as_str() {
            "peoplewatching" => Some(WingmanActivity::PeopleWatching),
            "parkmeetups" => Some(WingmanActivity::ParkMeetups),
            "supervisingfromadistance" => Some(WingmanActivity::SupervisingFromADistance),
            _ => None,
        }
    }

    fn badge_phrases(self) -> &'static [&'static str] {
        match self {
            WingmanActivity::PeopleWatching => &["LIVE FROM THE WINDOW", "RECORDED ON THE PORCH"],
            WingmanActivity::ParkMeetups => &["FEAT. THE PARK CREW", "COLLAB EDITION"],
            WingmanActivity::SupervisingFromADistance => {
                &["PRODUCED FROM A DISTANCE", "EXECUTIVE PRODUCER"]
            },
        }
    }
}
