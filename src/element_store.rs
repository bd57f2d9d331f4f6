use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    ops::{Deref, DerefMut},
};

use crate::{Element, ValueUpdate};

/// Elements of one property keyed by element name. Order is irrelevant.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementStore(HashMap<String, Element>);

impl Deref for ElementStore {
    type Target = HashMap<String, Element>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ElementStore {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromIterator<(String, Element)> for ElementStore {
    fn from_iter<I: IntoIterator<Item = (String, Element)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.0.len()
    }

    /// Overwrites the text of an already defined element. Elements are never
    /// created here: an unknown name yields `ValueUpdate::Unknown`.
    pub fn store_text(&mut self, name: &str, text: &str) -> ValueUpdate<String> {
        let Some(entry) = self.0.get_mut(name) else {
            return ValueUpdate::Unknown;
        };
        if entry.text != text {
            let old = std::mem::replace(&mut entry.text, text.to_owned());
            ValueUpdate::Changed {
                old,
                new: text.to_owned(),
            }
        } else {
            ValueUpdate::Equal
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|e| e.text.as_str())
    }
}
