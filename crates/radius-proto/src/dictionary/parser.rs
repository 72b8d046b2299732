//! Dictionary text format parser

use super::{AttributeCode, AttributeDefinition, DataType, DictionaryBuilder, DictionaryError};
use std::fs;
use std::path::{Path, PathBuf};

/// Parser state carried across one source and the files it includes
struct Parser<'a> {
    builder: &'a mut DictionaryBuilder,
    /// Files currently being parsed, outermost first
    include_stack: Vec<PathBuf>,
}

pub(super) fn load_file(
    builder: &mut DictionaryBuilder,
    path: &Path,
) -> Result<(), DictionaryError> {
    let mut parser = Parser {
        builder,
        include_stack: Vec::new(),
    };
    parser.parse_file(path)
}

pub(super) fn load_str(
    builder: &mut DictionaryBuilder,
    source_name: &str,
    text: &str,
    base_dir: &Path,
) -> Result<(), DictionaryError> {
    let mut parser = Parser {
        builder,
        include_stack: Vec::new(),
    };
    parser.parse_source(source_name, text, base_dir)
}

impl Parser<'_> {
    fn parse_file(&mut self, path: &Path) -> Result<(), DictionaryError> {
        let canonical = fs::canonicalize(path).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if self.include_stack.contains(&canonical) {
            return Err(DictionaryError::IncludeCycle(canonical));
        }

        let text = fs::read_to_string(&canonical).map_err(|source| DictionaryError::Io {
            path: canonical.clone(),
            source,
        })?;
        let base_dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        self.include_stack.push(canonical);
        let source_name = path.display().to_string();
        let result = self.parse_source(&source_name, &text, &base_dir);
        self.include_stack.pop();
        result
    }

    fn parse_source(
        &mut self,
        source_name: &str,
        text: &str,
        base_dir: &Path,
    ) -> Result<(), DictionaryError> {
        // Vendor opened by BEGIN-VENDOR, scoped to this source
        let mut block_vendor: Option<(String, u32)> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let location = format!("{}:{}", source_name, index + 1);
            let line = match raw_line.find('#') {
                Some(pos) => &raw_line[..pos],
                None => raw_line,
            };
            let fields: Vec<&str> = line.split_whitespace().collect();
            let Some(keyword) = fields.first() else {
                continue;
            };

            match *keyword {
                "ATTRIBUTE" => {
                    let vendor = block_vendor.as_ref().map(|(_, id)| *id);
                    let def = self.parse_attribute(&location, &fields, vendor)?;
                    self.builder.add_attribute(&location, def)?;
                }
                "VALUE" => {
                    let &[_, attribute, name, value] = fields.as_slice() else {
                        return Err(malformed(
                            &location,
                            "expected VALUE <attribute> <name> <number>",
                        ));
                    };
                    let value = parse_number(value)
                        .ok_or_else(|| malformed(&location, format!("invalid value '{}'", value)))?;
                    self.builder.add_value(&location, attribute, name, value)?;
                }
                "VENDOR" => {
                    if fields.len() < 3 || fields.len() > 4 {
                        return Err(malformed(&location, "expected VENDOR <name> <id> [format]"));
                    }
                    if let Some(format) = fields.get(3) {
                        if *format != "format=1,1" {
                            return Err(malformed(
                                &location,
                                format!("unsupported vendor format '{}'", format),
                            ));
                        }
                    }
                    let id = parse_number(fields[2]).ok_or_else(|| {
                        malformed(&location, format!("invalid vendor id '{}'", fields[2]))
                    })?;
                    self.builder.add_vendor(&location, fields[1], id)?;
                }
                "BEGIN-VENDOR" => {
                    let &[_, name] = fields.as_slice() else {
                        return Err(malformed(&location, "expected BEGIN-VENDOR <name>"));
                    };
                    if let Some((open, _)) = &block_vendor {
                        return Err(malformed(
                            &location,
                            format!("BEGIN-VENDOR {} while {} is still open", name, open),
                        ));
                    }
                    let id = self.vendor(&location, name)?;
                    block_vendor = Some((name.to_string(), id));
                }
                "END-VENDOR" => {
                    let &[_, name] = fields.as_slice() else {
                        return Err(malformed(&location, "expected END-VENDOR <name>"));
                    };
                    match &block_vendor {
                        Some((open, _)) if open == name => block_vendor = None,
                        _ => {
                            return Err(malformed(
                                &location,
                                format!("END-VENDOR {} does not match an open block", name),
                            ));
                        }
                    }
                }
                "$INCLUDE" => {
                    let &[_, target] = fields.as_slice() else {
                        return Err(malformed(&location, "expected $INCLUDE <path>"));
                    };
                    self.parse_file(&base_dir.join(target))?;
                }
                other => {
                    return Err(malformed(&location, format!("unknown keyword '{}'", other)));
                }
            }
        }

        if let Some((open, _)) = block_vendor {
            return Err(malformed(
                source_name,
                format!("BEGIN-VENDOR {} is never closed", open),
            ));
        }
        Ok(())
    }

    /// `ATTRIBUTE <name> <code> <type> [<vendor> | <flags>]`
    fn parse_attribute(
        &self,
        location: &str,
        fields: &[&str],
        block_vendor: Option<u32>,
    ) -> Result<AttributeDefinition, DictionaryError> {
        if fields.len() < 4 || fields.len() > 5 {
            return Err(malformed(
                location,
                "expected ATTRIBUTE <name> <code> <type> [vendor|flags]",
            ));
        }
        let name = fields[1];
        let code = parse_number(fields[2])
            .filter(|code| (1..=255).contains(code))
            .ok_or_else(|| malformed(location, format!("invalid attribute code '{}'", fields[2])))?
            as u8;
        let data_type: DataType =
            fields[3]
                .parse()
                .map_err(|_| DictionaryError::UnknownType {
                    location: location.to_string(),
                    data_type: fields[3].to_string(),
                })?;

        let mut vendor = block_vendor;
        let mut encrypted = false;
        if let Some(extra) = fields.get(4) {
            if is_flag_list(extra) {
                encrypted = parse_flags(location, extra)?;
            } else {
                // Old-style trailing vendor name
                vendor = Some(self.vendor(location, extra)?);
            }
        }

        let code = match vendor {
            Some(id) => AttributeCode::vendor(id, code),
            None => AttributeCode::standard(code),
        };
        let def = AttributeDefinition::new(name, code, data_type);
        if encrypted {
            if data_type != DataType::String && data_type != DataType::Octets {
                return Err(malformed(
                    location,
                    format!("encrypt=1 is not valid for {} attributes", data_type),
                ));
            }
            return Ok(def.with_encryption());
        }
        Ok(def)
    }

    fn vendor(&self, location: &str, name: &str) -> Result<u32, DictionaryError> {
        self.builder
            .vendor_id(name)
            .ok_or_else(|| DictionaryError::UnknownVendor {
                location: location.to_string(),
                vendor: name.to_string(),
            })
    }
}

fn is_flag_list(field: &str) -> bool {
    field
        .split(',')
        .all(|flag| flag.contains('=') || matches!(flag, "has_tag" | "concat" | "array"))
}

/// Parse attribute flags. Returns whether `encrypt=1` is present.
fn parse_flags(location: &str, field: &str) -> Result<bool, DictionaryError> {
    let mut encrypted = false;
    for flag in field.split(',') {
        match flag {
            "encrypt=1" => encrypted = true,
            "has_tag" | "concat" | "array" => {}
            other => {
                return Err(malformed(location, format!("unsupported flag '{}'", other)));
            }
        }
    }
    Ok(encrypted)
}

fn parse_number(text: &str) -> Option<u32> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

fn malformed(location: &str, reason: impl Into<String>) -> DictionaryError {
    DictionaryError::Malformed {
        location: location.to_string(),
        reason: reason.into(),
    }
}
