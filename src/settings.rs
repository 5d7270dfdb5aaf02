//! String keyed configuration
//!
//! Keys are case insensitive. A value given as a comma separated list is
//! stored as an array, `get` returning its first element.

use std::collections::HashMap;

use crate::error::Error;

macro_rules! keys {
    ( $( $key:ident ),* ) => {
        /// Settings read by the mosaicking core
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Key {
            $( $key ),*
        }

        impl Key {
            pub fn name(&self) -> &'static str {
                match self {
                    $( Key::$key => stringify!($key) ),*
                }
            }
        }
    };
}

keys!(
    ExposureFinder,
    ExposureKeyword,
    ExposureFileMatch,
    ExposureFileGen,
    BackupSurvey,
    NoNormalize,
    ImageFinder,
    StrictGeometry,
    Edge,
    BlankValue,
    Sampler
);

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    values: HashMap<String, Vec<String>>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, replacing its previous values
    pub fn put<K: AsRef<str>>(&mut self, key: K, value: &str) -> &mut Self {
        let values = value
            .split(',')
            .map(|v| v.trim().to_string())
            .collect::<Vec<_>>();
        self.values.insert(normalize_key(key.as_ref()), values);
        self
    }

    pub fn remove<K: AsRef<str>>(&mut self, key: K) -> Option<Vec<String>> {
        self.values.remove(&normalize_key(key.as_ref()))
    }

    pub fn has<K: AsRef<str>>(&self, key: K) -> bool {
        self.values.contains_key(&normalize_key(key.as_ref()))
    }

    /// First value of a key
    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&str> {
        self.get_array(key).first().map(String::as_str)
    }

    /// Every value of a key, empty when it is not set
    pub fn get_array<K: AsRef<str>>(&self, key: K) -> &[String] {
        self.values
            .get(&normalize_key(key.as_ref()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Numeric value of a key. A value that is not a number is an error,
    /// a missing key is not
    pub fn get_f64<K: AsRef<str>>(&self, key: K) -> Result<Option<f64>, Error> {
        let key = key.as_ref();
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .parse::<f64>()
                .map(Some)
                .map_err(|_| Error::InvalidSetting(key.to_string(), value.to_string())),
        }
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut settings = Settings::new();
        for (key, value) in iter {
            settings.put(key, value.as_ref());
        }
        settings
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}
