use crate::value::SoapValue;

/// Parameters of a SOAP request, in the order they are sent.
///
/// Names may repeat; [`SoapParameters::set`] replaces instead of appending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoapParameters {
    entries: Vec<(String, SoapValue)>,
}

impl SoapParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter, keeping any earlier one with the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<SoapValue>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Builder form of [`SoapParameters::add`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SoapValue>) -> Self {
        self.add(name, value);
        self
    }

    /// Replaces every parameter called `name` by a single one at the
    /// position of the first, or appends it.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<SoapValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter().position(|(n, _)| *n == name) {
            Some(first) => {
                self.entries[first].1 = value;
                let mut index = 0;
                self.entries.retain(|(n, _)| {
                    let keep = index <= first || *n != name;
                    index += 1;
                    keep
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SoapValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a SoapValue> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Combines service-level defaults with request parameters. Service
    /// parameters come first. Every request value whose name the service
    /// also defines replaces the service values at the position of the first
    /// of them, repeated names included; other request parameters are
    /// appended in order.
    pub fn merge(service: &SoapParameters, request: &SoapParameters) -> SoapParameters {
        let overridden = |name: &str| request.get(name).is_some();
        let mut merged = SoapParameters::new();
        let mut placed: Vec<&str> = Vec::new();
        for (name, value) in &service.entries {
            if !overridden(name) {
                merged.entries.push((name.clone(), value.clone()));
            } else if !placed.contains(&name.as_str()) {
                placed.push(name);
                merged.entries.extend(
                    request
                        .entries
                        .iter()
                        .filter(|(n, _)| n == name)
                        .cloned(),
                );
            }
        }
        merged.entries.extend(
            request
                .entries
                .iter()
                .filter(|(n, _)| service.get(n).is_none())
                .cloned(),
        );
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SoapValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
