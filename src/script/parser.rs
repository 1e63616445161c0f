use crate::foundation::core::Point;
use crate::foundation::error::{SsbError, SsbResult};
use crate::script::model::{Document, Event, Geometry, Object};
use crate::script::tags::{GeometryMode, Tag, parse_tag_block};
use crate::script::time::parse_time;
use crate::transform::path::{PathSegment, path_by_arc};
use std::io::BufRead;

/// Upper bound on `\\name\\` macro substitutions per event line.
pub const MAX_INLINE_STYLES: usize = 64;

const MACRO_DELIMITER: &str = "\\\\";
const BOM: char = '\u{feff}';

/// How strictly malformed input is reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParseLevel {
    /// Best effort; nothing is raised.
    Off,
    /// Structurally malformed lines raise.
    #[default]
    Syntax,
    /// Invalid values and unresolved references raise too.
    All,
}

impl ParseLevel {
    /// Map a host-side warnings toggle onto a level.
    pub fn from_warnings(warnings: bool) -> Self {
        if warnings { Self::All } else { Self::Off }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    None,
    Meta,
    Frame,
    Styles,
    Events,
}

/// Incremental SSB script parser.
///
/// Lines can be fed one at a time with [`ScriptParser::parse_line`] (the caller decides how to
/// recover from errors) or as a whole with [`ScriptParser::parse_script`], which stops at the
/// first error and tags it with its line number.
#[derive(Debug)]
pub struct ScriptParser {
    level: ParseLevel,
    section: Section,
    doc: Document,
}

impl ScriptParser {
    /// Create a parser with an empty document.
    pub fn new(level: ParseLevel) -> Self {
        Self {
            level,
            section: Section::None,
            doc: Document::default(),
        }
    }

    /// Strictness this parser was created with.
    pub fn level(&self) -> ParseLevel {
        self.level
    }

    /// The document parsed so far.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Consume the parser and return its document.
    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Parse a complete script held in memory.
    pub fn parse_script(&mut self, text: &str) -> SsbResult<()> {
        let text = text.strip_prefix(BOM).unwrap_or(text);
        for (idx, line) in text.lines().enumerate() {
            self.parse_line(line).map_err(|e| e.at_line(idx + 1))?;
        }
        Ok(())
    }

    /// Parse a complete script from a reader.
    ///
    /// Lines that are not valid UTF-8 are a syntax error; below that level they are decoded
    /// lossily and parsed anyway.
    pub fn parse_reader(&mut self, mut reader: impl BufRead) -> SsbResult<()> {
        let mut buf = Vec::new();
        let mut idx = 0;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            idx += 1;
            let raw = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
            let text = String::from_utf8_lossy(raw);
            if std::str::from_utf8(raw).is_err() {
                self.syntax(SsbError::parse("line is not valid UTF-8"))
                    .map_err(|e| e.at_line(idx))?;
            }
            let line = if idx == 1 {
                text.strip_prefix(BOM).unwrap_or(&*text)
            } else {
                &*text
            };
            self.parse_line(line).map_err(|e| e.at_line(idx))?;
        }
    }

    /// Parse one line of script text.
    pub fn parse_line(&mut self, line: &str) -> SsbResult<()> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let line = line.strip_prefix(BOM).unwrap_or(line);
        if line.trim().is_empty() || line.starts_with("//") {
            return Ok(());
        }

        if let Some(name) = line.strip_prefix('#') {
            let section = match name.trim_end() {
                "META" => Section::Meta,
                "FRAME" => Section::Frame,
                "STYLES" => Section::Styles,
                "EVENTS" => Section::Events,
                other => {
                    return self.syntax(SsbError::parse(format!("unknown section \"{other}\"")));
                }
            };
            self.section = section;
            return Ok(());
        }

        match self.section {
            Section::None => self.syntax(SsbError::parse("content outside of a section")),
            Section::Meta => self.parse_meta(line),
            Section::Frame => self.parse_frame(line),
            Section::Styles => self.parse_style(line),
            Section::Events => self.parse_event(line),
        }
    }

    fn syntax(&self, err: SsbError) -> SsbResult<()> {
        self.raise_at(ParseLevel::Syntax, err)
    }

    fn semantic(&self, err: SsbError) -> SsbResult<()> {
        self.raise_at(ParseLevel::All, err)
    }

    fn raise_at(&self, level: ParseLevel, err: SsbError) -> SsbResult<()> {
        if self.level >= level {
            Err(err)
        } else {
            tracing::debug!(error = %err, "ignoring script error");
            Ok(())
        }
    }

    fn parse_meta(&mut self, line: &str) -> SsbResult<()> {
        let Some((key, value)) = line.split_once(": ") else {
            return self.syntax(SsbError::parse(format!("invalid meta line \"{line}\"")));
        };
        let slot = match key {
            "Title" => &mut self.doc.meta.title,
            "Author" => &mut self.doc.meta.author,
            "Description" => &mut self.doc.meta.description,
            "Version" => &mut self.doc.meta.version,
            other => return self.syntax(SsbError::parse(format!("unknown meta key \"{other}\""))),
        };
        *slot = value.to_owned();
        Ok(())
    }

    fn parse_frame(&mut self, line: &str) -> SsbResult<()> {
        let Some((key, value)) = line.split_once(": ") else {
            return self.syntax(SsbError::parse(format!("invalid frame line \"{line}\"")));
        };
        let parsed = value.trim().parse::<u32>();
        let slot = match key {
            "Width" => &mut self.doc.frame.width,
            "Height" => &mut self.doc.frame.height,
            other => {
                return self.syntax(SsbError::parse(format!("unknown frame key \"{other}\"")));
            }
        };
        match parsed {
            Ok(v) => {
                *slot = v;
                Ok(())
            }
            Err(_) => self.semantic(SsbError::parse(format!("invalid frame {key} \"{value}\""))),
        }
    }

    fn parse_style(&mut self, line: &str) -> SsbResult<()> {
        let Some((name, content)) = line.split_once(": ") else {
            return self.syntax(SsbError::parse(format!("invalid style line \"{line}\"")));
        };
        self.doc.styles.insert(name.to_owned(), content.to_owned());
        Ok(())
    }

    fn parse_event(&mut self, line: &str) -> SsbResult<()> {
        let invalid = || SsbError::parse(format!("invalid event \"{line}\""));
        let Some((times, rest)) = line.split_once('|') else {
            return self.syntax(invalid());
        };
        let fields: Vec<&str> = rest.splitn(3, '|').collect();
        let [style, _note, text] = fields.as_slice() else {
            return self.syntax(invalid());
        };
        let Some((start, end)) = times.split_once('-') else {
            return self.syntax(invalid());
        };
        let (start_ms, end_ms) = match (parse_time(start.trim()), parse_time(end.trim())) {
            (Ok(s), Ok(e)) => (s, e),
            (Err(e), _) | (_, Err(e)) => return self.syntax(e),
        };
        if start_ms > end_ms {
            self.semantic(SsbError::parse("start time must not be after end time"))?;
        }

        let prefix = if style.is_empty() {
            ""
        } else if let Some(content) = self.doc.styles.get(*style) {
            content.as_str()
        } else {
            self.semantic(SsbError::reference(format!("unknown style \"{style}\"")))?;
            ""
        };
        let text = self.expand_macros(format!("{prefix}{text}"));

        let Some(objects) = self.parse_objects(&text)? else {
            return Ok(());
        };
        let static_tags = !objects
            .iter()
            .any(|o| matches!(o, Object::Tag(t) if t.is_time_dependent()));
        self.doc.events.push(Event {
            start_ms,
            end_ms,
            objects,
            static_tags,
        });
        Ok(())
    }

    /// Substitute `\\name\\` references with style contents, rescanning inserted text.
    fn expand_macros(&self, mut text: String) -> String {
        let mut budget = MAX_INLINE_STYLES;
        let mut pos = 0usize;
        while budget > 0 {
            let Some(open) = text[pos..].find(MACRO_DELIMITER).map(|i| pos + i) else {
                break;
            };
            let name_start = open + MACRO_DELIMITER.len();
            let Some(close) = text[name_start..]
                .find(MACRO_DELIMITER)
                .map(|i| name_start + i)
            else {
                break;
            };
            match self.doc.styles.get(&text[name_start..close]) {
                Some(content) => {
                    let content = content.clone();
                    text.replace_range(open..close + MACRO_DELIMITER.len(), &content);
                    budget -= 1;
                    pos = open;
                }
                None => pos = close,
            }
        }
        text
    }

    /// Split event text into tags and geometry. `None` means the line is dropped.
    fn parse_objects(&self, text: &str) -> SsbResult<Option<Vec<Object>>> {
        let mut objects = Vec::new();
        let mut mode = GeometryMode::Text;
        let mut geometry = String::new();
        let mut pos = 0usize;

        while let Some(c) = text[pos..].chars().next() {
            match c {
                '\\' => {
                    geometry.push(c);
                    pos += 1;
                    if let Some(next) = text[pos..].chars().next() {
                        geometry.push(next);
                        pos += next.len_utf8();
                    }
                }
                '{' => {
                    self.flush_geometry(&mut geometry, mode, &mut objects)?;
                    let body = pos + 1;
                    let Some(len) = text[body..].find('}') else {
                        self.syntax(SsbError::parse("unclosed tag block"))?;
                        return Ok(None);
                    };
                    for tag in parse_tag_block(&text[body..body + len]) {
                        match tag {
                            Ok(tag) => {
                                if let Tag::Geometry(m) = tag {
                                    mode = m;
                                }
                                objects.push(Object::Tag(tag));
                            }
                            Err(e) => self.semantic(e)?,
                        }
                    }
                    pos = body + len + 1;
                }
                _ => {
                    geometry.push(c);
                    pos += c.len_utf8();
                }
            }
        }
        self.flush_geometry(&mut geometry, mode, &mut objects)?;
        Ok(Some(objects))
    }

    fn flush_geometry(
        &self,
        raw: &mut String,
        mode: GeometryMode,
        objects: &mut Vec<Object>,
    ) -> SsbResult<()> {
        if raw.is_empty() {
            return Ok(());
        }
        let parsed = match mode {
            GeometryMode::Text => Ok(Some(Geometry::Text(unescape_text(raw)))),
            GeometryMode::Points if raw.trim().is_empty() => Ok(None),
            GeometryMode::Points => parse_points(raw).map(|p| Some(Geometry::Points(p))),
            GeometryMode::Path if raw.trim().is_empty() => Ok(None),
            GeometryMode::Path => parse_path(raw).map(|p| Some(Geometry::Path(p))),
        };
        raw.clear();
        match parsed {
            Ok(Some(g)) => objects.push(Object::Geometry(g)),
            Ok(None) => {}
            Err(e) => self.semantic(e)?,
        }
        Ok(())
    }
}

fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(e @ ('{' | '}' | '\\')) => out.push(e),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn geometry_number(token: &str) -> SsbResult<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SsbError::parse(format!("invalid coordinate \"{token}\"")))
}

fn parse_points(raw: &str) -> SsbResult<Vec<Point>> {
    let values = raw
        .split_whitespace()
        .map(geometry_number)
        .collect::<SsbResult<Vec<f64>>>()?;
    if values.len() % 2 != 0 {
        return Err(SsbError::parse("points need an even number of coordinates"));
    }
    Ok(values.chunks_exact(2).map(|p| Point::new(p[0], p[1])).collect())
}

fn parse_path(raw: &str) -> SsbResult<Vec<PathSegment>> {
    let mut out: Vec<PathSegment> = Vec::new();
    let mut command: Option<char> = None;
    let mut args: Vec<f64> = Vec::with_capacity(6);
    let mut current: Option<(f64, f64)> = None;
    let mut subpath_start: Option<(f64, f64)> = None;

    let no_current = |cmd: char| SsbError::parse(format!("path command '{cmd}' needs a current point"));

    for token in raw.split_whitespace() {
        if let [c @ (b'm' | b'l' | b'b' | b'a' | b'c')] = token.as_bytes() {
            if !args.is_empty() {
                return Err(SsbError::parse("incomplete path command arguments"));
            }
            let cmd = char::from(*c);
            if cmd == 'c' {
                if current.is_some() {
                    out.push(PathSegment::close());
                    current = subpath_start;
                }
                command = None;
            } else {
                command = Some(cmd);
            }
            continue;
        }

        let cmd = command.ok_or_else(|| SsbError::parse(format!("coordinate \"{token}\" without a path command")))?;
        args.push(geometry_number(token)?);

        match (cmd, args.as_slice()) {
            ('m', &[x, y]) => {
                out.push(PathSegment::move_to(x, y));
                current = Some((x, y));
                subpath_start = current;
                // Further pairs after a move draw lines.
                command = Some('l');
            }
            ('l', &[x, y]) => {
                current.ok_or_else(|| no_current('l'))?;
                out.push(PathSegment::line_to(x, y));
                current = Some((x, y));
            }
            ('b', &[x1, y1, x2, y2, x3, y3]) => {
                current.ok_or_else(|| no_current('b'))?;
                out.push(PathSegment::curve(x1, y1));
                out.push(PathSegment::curve(x2, y2));
                out.push(PathSegment::curve(x3, y3));
                current = Some((x3, y3));
            }
            ('a', &[cx, cy, angle]) => {
                let (x, y) = current.ok_or_else(|| no_current('a'))?;
                let arc = path_by_arc(x, y, cx, cy, angle.to_radians());
                if let Some(end) = arc.last() {
                    current = Some((end.x, end.y));
                }
                out.extend(arc);
            }
            _ => continue,
        }
        args.clear();
    }

    if !args.is_empty() {
        return Err(SsbError::parse("incomplete path command arguments"));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/script/parser.rs"]
mod tests;
