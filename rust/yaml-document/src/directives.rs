// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! `%YAML` and `%TAG` directives and tag handle resolution.

use chumsky::prelude::*;
use ordermap::OrderMap;

use crate::options::Version;

/// Prefix of the `!!` handle.
pub const YAML_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// The `%YAML` directive state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YamlDirective {
    pub version: Version,
    /// Set when the source carried a `%YAML` line.
    pub explicit: bool,
}

impl Default for YamlDirective {
    fn default() -> Self {
        Self {
            version: Version::V1_2,
            explicit: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directives {
    pub yaml: YamlDirective,
    /// Tag handle to prefix, in declaration order.
    pub tags: OrderMap<String, String>,
    /// The document was started with an explicit `---`.
    pub doc_start: bool,
    /// The document was ended with an explicit `...`.
    pub doc_end: bool,
    at_next_document: bool,
}

impl Default for Directives {
    fn default() -> Self {
        Self::new(YamlDirective::default())
    }
}

fn default_tags() -> OrderMap<String, String> {
    OrderMap::from([("!!".to_owned(), YAML_TAG_PREFIX.to_owned())])
}

/// Split a directive line into its name and parameters.
fn directive_line<'src>()
-> impl Parser<'src, &'src str, (&'src str, Vec<&'src str>), extra::Err<Rich<'src, char>>> {
    let ws = one_of(" \t").repeated().at_least(1);
    let word = none_of(" \t").repeated().at_least(1).to_slice();
    one_of(" \t")
        .repeated()
        .ignore_then(just('%'))
        .ignore_then(word)
        .then(ws.ignore_then(word).repeated().collect::<Vec<_>>())
        .then_ignore(one_of(" \t").repeated())
        .then_ignore(end())
}

/// Percent-decode a tag suffix.
fn percent_decode(suffix: &str) -> Result<String, String> {
    let bytes = suffix.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = suffix
                .get(i + 1..i + 3)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| format!("URIError: malformed escape in {suffix}"))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| format!("URIError: invalid UTF-8 in {suffix}"))
}

fn escape_tag_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            '!' => out.push_str("%21"),
            ',' => out.push_str("%2C"),
            '[' => out.push_str("%5B"),
            ']' => out.push_str("%5D"),
            '{' => out.push_str("%7B"),
            '}' => out.push_str("%7D"),
            _ => out.push(ch),
        }
    }
    out
}

impl Directives {
    #[must_use]
    pub fn new(yaml: YamlDirective) -> Self {
        Self {
            yaml,
            tags: default_tags(),
            doc_start: false,
            doc_end: false,
            at_next_document: false,
        }
    }

    #[must_use]
    pub fn for_version(version: Version) -> Self {
        Self::new(YamlDirective {
            version,
            explicit: false,
        })
    }

    /// Directives for the document that starts now.
    ///
    /// Under 1.1, handles carry over to the next document unless it brings
    /// its own directives; under 1.2 every document starts from defaults.
    pub fn at_document(&mut self) -> Self {
        let res = Self {
            yaml: self.yaml,
            tags: self.tags.clone(),
            doc_start: false,
            doc_end: false,
            at_next_document: false,
        };
        match self.yaml.version {
            Version::V1_1 => self.at_next_document = true,
            Version::V1_2 => {
                self.at_next_document = false;
                self.yaml = YamlDirective::default();
                self.tags = default_tags();
            }
        }
        res
    }

    /// Apply a `%` directive line. `on_error` receives the offset within the
    /// line, a message and whether the problem is only a warning.
    pub fn add(&mut self, line: &str, on_error: &mut dyn FnMut(usize, String, bool)) -> bool {
        if self.at_next_document {
            self.yaml = YamlDirective {
                version: Version::V1_1,
                explicit: false,
            };
            self.tags = default_tags();
            self.at_next_document = false;
        }
        let (parsed, errs) = directive_line().parse(line).into_output_errors();
        let Some((name, parts)) = parsed else {
            let message = errs
                .first()
                .map_or_else(|| format!("Invalid directive {line}"), ToString::to_string);
            on_error(0, message, false);
            return false;
        };
        match name {
            "TAG" => {
                if parts.len() != 2 {
                    on_error(0, "%TAG directive should contain exactly two parts".into(), false);
                    if parts.len() < 2 {
                        return false;
                    }
                }
                self.tags.insert(parts[0].to_owned(), parts[1].to_owned());
                true
            }
            "YAML" => {
                self.yaml.explicit = true;
                let [version] = parts.as_slice() else {
                    on_error(0, "%YAML directive should contain exactly one part".into(), false);
                    return false;
                };
                if let Ok(version) = Version::try_from(*version) {
                    self.yaml.version = version;
                    true
                } else {
                    let is_valid = version.split_once('.').is_some_and(|(major, minor)| {
                        !major.is_empty()
                            && !minor.is_empty()
                            && major.bytes().all(|b| b.is_ascii_digit())
                            && minor.bytes().all(|b| b.is_ascii_digit())
                    });
                    on_error(6, format!("Unsupported YAML version {version}"), is_valid);
                    false
                }
            }
            _ => {
                on_error(0, format!("Unknown directive %{name}"), true);
                false
            }
        }
    }

    /// Resolve a tag token such as `!!str`, `!local`, `!h!x` or `!<tag:x>`
    /// to a full tag name.
    pub fn tag_name(&self, source: &str, on_error: &mut dyn FnMut(String)) -> Option<String> {
        if source == "!" {
            // non-specific tag
            return Some("!".to_owned());
        }
        if !source.starts_with('!') {
            on_error(format!("Not a valid tag: {source}"));
            return None;
        }
        if let Some(rest) = source.strip_prefix("!<") {
            let verbatim = rest.strip_suffix('>').unwrap_or_else(|| {
                on_error("Verbatim tags must end with a >".to_owned());
                rest
            });
            if verbatim == "!" || verbatim == "!!" {
                on_error(format!(
                    "Verbatim tags aren't resolved, so {source} is invalid."
                ));
                return None;
            }
            return Some(verbatim.to_owned());
        }
        let split = source.rfind('!').map_or(0, |i| i + 1);
        let (handle, suffix) = source.split_at(split);
        if suffix.is_empty() {
            on_error(format!("The {source} tag has no suffix"));
        }
        if let Some(prefix) = self.tags.get(handle) {
            return match percent_decode(suffix) {
                Ok(decoded) => Some(format!("{prefix}{decoded}")),
                Err(error) => {
                    on_error(error);
                    None
                }
            };
        }
        if handle == "!" {
            // local tag
            return Some(source.to_owned());
        }
        on_error(format!("Could not resolve tag: {source}"));
        None
    }

    /// The shortest spelling of `tag` using the declared handles.
    #[must_use]
    pub fn tag_string(&self, tag: &str) -> String {
        for (handle, prefix) in &self.tags {
            if let Some(rest) = tag.strip_prefix(prefix.as_str()) {
                return format!("{handle}{}", escape_tag_name(rest));
            }
        }
        if tag.starts_with('!') {
            tag.to_owned()
        } else {
            format!("!<{tag}>")
        }
    }

    /// Directive lines for output. With `used_tags`, only `%TAG` handles
    /// whose prefix is used by some tag are emitted.
    #[must_use]
    pub fn to_string(&self, used_tags: Option<&[String]>) -> String {
        let mut lines = Vec::new();
        if self.yaml.explicit {
            lines.push(format!("%YAML {}", self.yaml.version.as_str()));
        }
        for (handle, prefix) in &self.tags {
            if handle == "!!" && prefix == YAML_TAG_PREFIX {
                continue;
            }
            if used_tags.is_none_or(|tags| tags.iter().any(|tag| tag.starts_with(prefix.as_str())))
            {
                lines.push(format!("%TAG {handle} {prefix}"));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(directives: &mut Directives, line: &str) -> (bool, Vec<(String, bool)>) {
        let mut errors = Vec::new();
        let ok = directives.add(line, &mut |_, msg, warning| errors.push((msg, warning)));
        (ok, errors)
    }

    #[test]
    fn test_yaml_directive() {
        let mut directives = Directives::default();
        let (ok, errors) = add(&mut directives, "%YAML 1.1");
        assert!(ok);
        assert!(errors.is_empty());
        assert_eq!(directives.yaml.version, Version::V1_1);
        assert!(directives.yaml.explicit);

        let (ok, errors) = add(&mut directives, "%YAML 1.3");
        assert!(!ok);
        assert_eq!(errors, vec![("Unsupported YAML version 1.3".to_owned(), true)]);
    }

    #[test]
    fn test_tag_directive_and_resolution() {
        let mut directives = Directives::default();
        let (ok, _) = add(&mut directives, "%TAG !e! tag:example.com,2000:app/");
        assert!(ok);
        let mut errors = Vec::new();
        let mut on_error = |msg: String| errors.push(msg);
        let test_cases = [
            ("!!str", Some("tag:yaml.org,2002:str")),
            ("!e!foo%21", Some("tag:example.com,2000:app/foo!")),
            ("!local", Some("!local")),
            ("!", Some("!")),
            ("!<tag:x,2000:y>", Some("tag:x,2000:y")),
            ("!u!x", None),
        ];
        for (source, expected) in test_cases {
            assert_eq!(
                directives.tag_name(source, &mut on_error).as_deref(),
                expected,
                "{source}"
            );
        }
        assert_eq!(errors, vec!["Could not resolve tag: !u!x".to_owned()]);
    }

    #[test]
    fn test_tag_string() {
        let mut directives = Directives::default();
        add(&mut directives, "%TAG !e! tag:example.com,2000:");
        assert_eq!(directives.tag_string("tag:yaml.org,2002:str"), "!!str");
        assert_eq!(directives.tag_string("tag:example.com,2000:a,b"), "!e!a%2Cb");
        assert_eq!(directives.tag_string("!local"), "!local");
        assert_eq!(directives.tag_string("tag:other:x"), "!<tag:other:x>");
    }

    #[test]
    fn test_unknown_directive_is_warning() {
        let mut directives = Directives::default();
        let (ok, errors) = add(&mut directives, "%FOO bar");
        assert!(!ok);
        assert_eq!(errors, vec![("Unknown directive %FOO".to_owned(), true)]);
    }

    #[test]
    fn test_at_document_inheritance() {
        let mut directives = Directives::default();
        add(&mut directives, "%TAG !e! tag:e:");
        let doc = directives.at_document();
        assert!(doc.tags.contains_key("!e!"));
        // 1.2 resets after each document
        assert!(!directives.tags.contains_key("!e!"));

        let mut directives = Directives::for_version(Version::V1_1);
        add(&mut directives, "%TAG !e! tag:e:");
        let _ = directives.at_document();
        // 1.1 keeps handles until new directives arrive
        assert!(directives.tags.contains_key("!e!"));
        add(&mut directives, "%YAML 1.1");
        assert!(!directives.tags.contains_key("!e!"));
    }

    #[test]
    fn test_to_string() {
        let mut directives = Directives::default();
        add(&mut directives, "%YAML 1.2");
        add(&mut directives, "%TAG !e! tag:e:");
        assert_eq!(directives.to_string(None), "%YAML 1.2\n%TAG !e! tag:e:");
        assert_eq!(directives.to_string(Some(&[])), "%YAML 1.2");
    }
}
