//! Case-insensitive term matching over free text.
//!
//! A [`TermMatcher`] maps canonical terms to the surface forms accepted for
//! them. A term matches when any of its forms occurs as a substring of the
//! lower-cased text. All section, diagnosis and disallowed-term checks go
//! through this type so the matching policy lives in configuration.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub name: String,
    forms: Vec<String>,
}

impl Term {
    /// A term with no explicit forms matches its own name.
    pub fn new(name: impl Into<String>, forms: &[String]) -> Self {
        let name = name.into();
        let mut forms: Vec<String> = forms
            .iter()
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        if forms.is_empty() {
            forms.push(name.trim().to_lowercase());
        }
        let mut seen = std::collections::BTreeSet::new();
        forms.retain(|f| seen.insert(f.clone()));
        Self { name, forms }
    }

    pub fn forms(&self) -> &[String] {
        &self.forms
    }

    /// `lowered` must already be lower-case.
    fn found_in(&self, lowered: &str) -> bool {
        self.forms
            .iter()
            .any(|f| !f.is_empty() && lowered.contains(f.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermMatcher {
    terms: Vec<Term>,
}

impl TermMatcher {
    pub fn from_terms(terms: Vec<Term>) -> Self {
        Self { terms }
    }

    /// Each entry is its own single surface form.
    pub fn literal<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            terms: names.iter().map(|n| Term::new(n.as_ref(), &[])).collect(),
        }
    }

    /// Canonical term -> accepted surface forms. Terms come out in key order.
    pub fn from_map(map: &BTreeMap<String, Vec<String>>) -> Self {
        Self {
            terms: map.iter().map(|(k, v)| Term::new(k.clone(), v)).collect(),
        }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Looks a term up by name, ignoring case and surrounding whitespace.
    pub fn get(&self, name: &str) -> Option<&Term> {
        let key = name.trim().to_lowercase();
        self.terms
            .iter()
            .find(|t| t.name.trim().to_lowercase() == key)
    }

    /// Canonical names of every term found in `text`, in matcher order.
    pub fn find_all(&self, text: &str) -> Vec<&str> {
        let lowered = text.to_lowercase();
        self.terms
            .iter()
            .filter(|t| t.found_in(&lowered))
            .map(|t| t.name.as_str())
            .collect()
    }

    /// Whether `name` is found in `text`. Unknown names fall back to a literal
    /// match of the name itself.
    pub fn is_found(&self, name: &str, text: &str) -> bool {
        let lowered = text.to_lowercase();
        match self.get(name) {
            Some(t) => t.found_in(&lowered),
            None => Term::new(name, &[]).found_in(&lowered),
        }
    }

    /// A matcher holding these terms followed by `extra` literal terms not
    /// already present (compared case-insensitively).
    pub fn with_literals<S: AsRef<str>>(&self, extra: &[S]) -> Self {
        let mut terms = self.terms.clone();
        for e in extra {
            let e = e.as_ref();
            let duplicate = terms
                .iter()
                .any(|t| t.name.trim().eq_ignore_ascii_case(e.trim()));
            if e.trim().is_empty() || duplicate {
                continue;
            }
            terms.push(Term::new(e, &[]));
        }
        Self { terms }
    }
}
