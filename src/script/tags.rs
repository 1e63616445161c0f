use crate::effects::blend::BlendOp;
use crate::expression::Formula;
use crate::foundation::core::{Point, TimeMs};
use crate::foundation::error::{SsbError, SsbResult};
use smallvec::SmallVec;
use std::str::FromStr;

/// Bold/italic/underline/strikeout flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FontStyle {
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
    /// Underline decoration.
    pub underline: bool,
    /// Strikeout decoration.
    pub strikeout: bool,
}

macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $kw:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl FromStr for $name {
            type Err = SsbError;

            fn from_str(s: &str) -> SsbResult<Self> {
                match s {
                    $($kw => Ok(Self::$variant),)+
                    other => Err(SsbError::parse(format!(
                        concat!("invalid ", stringify!($name), " \"{}\""),
                        other
                    ))),
                }
            }
        }
    };
}

keyword_enum!(
    /// Stroke corner style.
    LineJoin {
        /// Rounded corners.
        Round => "round",
        /// Beveled corners.
        Bevel => "bevel",
        /// Mitered corners.
        Miter => "miter",
    }
);

keyword_enum!(
    /// Stroke end style.
    LineCap {
        /// Square end at the endpoint.
        Flat => "flat",
        /// Rounded end.
        Round => "round",
        /// Square end extended by half the line width.
        Square => "square",
    }
);

keyword_enum!(
    /// How geometry text following a tag block is interpreted.
    GeometryMode {
        /// Whitespace-separated `x y` pairs.
        Points => "points",
        /// Path commands.
        Path => "path",
        /// Text drawn with the current font.
        Text => "text",
    }
);

keyword_enum!(
    /// Fill or outline drawing.
    FillMode {
        /// Filled shapes.
        Fill => "fill",
        /// Outlines only.
        Wire => "wire",
        /// Filled bounding boxes.
        Boxed => "boxed",
    }
);

keyword_enum!(
    /// Text flow direction.
    Direction {
        /// Left to right.
        Ltr => "ltr",
        /// Right to left.
        Rtl => "rtl",
        /// Top to bottom.
        Ttb => "ttb",
    }
);

keyword_enum!(
    /// Axis selection of the `rotate` tag.
    RotateAxis {
        /// Around x.
        X => "x",
        /// Around y.
        Y => "y",
        /// Around z.
        Z => "z",
        /// Around x, then y.
        Xy => "xy",
        /// Around y, then x.
        Yx => "yx",
    }
);

keyword_enum!(
    /// Texture sampling outside the image.
    TextureWrap {
        /// Repeat edge pixels.
        Clamp => "clamp",
        /// Tile.
        Repeat => "repeat",
        /// Tile with alternating mirroring.
        Mirror => "mirror",
    }
);

keyword_enum!(
    /// Per-event stencil operation.
    StencilMode {
        /// Draw normally.
        Off => "off",
        /// Add coverage to the stencil without drawing.
        Set => "set",
        /// Remove coverage from the stencil without drawing.
        Unset => "unset",
        /// Draw only where the stencil is set.
        Inside => "inside",
        /// Draw only where the stencil is unset.
        Outside => "outside",
    }
);

keyword_enum!(
    /// Karaoke highlight effect.
    KaraokeMode {
        /// Sweep the karaoke color left to right across the syllable.
        Fill => "fill",
        /// Switch to the karaoke color at the syllable start.
        Solid => "solid",
        /// Fade to the karaoke color across the syllable.
        Glow => "glow",
    }
);

/// Straight RGB color with unit-interval channels.
pub type Rgb = [f64; 3];

/// Parameters of an `animate` tag.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Animation {
    /// Start offset in ms from the event start; negative counts back from the event end.
    pub start: Option<i64>,
    /// End offset, same convention as `start`.
    pub end: Option<i64>,
    /// Progress formula over `t`.
    pub formula: Option<String>,
    /// Tags interpolated by the progress.
    pub tags: Vec<Tag>,
}

/// One style, transform or timing instruction from a tag block.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "tag", content = "value", rename_all = "kebab-case")]
pub enum Tag {
    /// Font family name.
    FontFamily(String),
    /// Font style flags.
    FontStyle(FontStyle),
    /// Font size.
    FontSize(f64),
    /// Character/line spacing; `None` keeps the current value.
    FontSpace {
        /// Horizontal spacing.
        h: Option<f64>,
        /// Vertical spacing.
        v: Option<f64>,
    },
    /// Stroke width.
    LineWidth(f64),
    /// Stroke join and cap.
    LineStyle {
        /// Join style.
        join: LineJoin,
        /// Cap style.
        cap: LineCap,
    },
    /// Dash offset and pattern; an empty pattern disables dashing.
    LineDash {
        /// Offset into the pattern.
        offset: f64,
        /// Alternating dash/gap lengths.
        dashes: SmallVec<[f64; 4]>,
    },
    /// Geometry interpretation mode.
    Geometry(GeometryMode),
    /// Fill mode.
    Mode(FillMode),
    /// Point deformation formulas.
    Deform {
        /// Formula for the new x.
        x: String,
        /// Formula for the new y.
        y: String,
    },
    /// Explicit anchor position; `None` restores automatic placement.
    Position(Option<Point>),
    /// Numpad alignment 1-9.
    Alignment(u8),
    /// Frame margins; `None` keeps the current value.
    Margin {
        /// Horizontal margin.
        h: Option<f64>,
        /// Vertical margin.
        v: Option<f64>,
    },
    /// Text direction.
    Direction(Direction),
    /// Reset the transform.
    Identity,
    /// Translation.
    Translate {
        /// x offset.
        x: f64,
        /// y offset.
        y: f64,
        /// z offset.
        z: f64,
    },
    /// Scale.
    Scale {
        /// x factor.
        x: f64,
        /// y factor.
        y: f64,
        /// z factor.
        z: f64,
    },
    /// Rotation in degrees.
    Rotate {
        /// Axis selection.
        axis: RotateAxis,
        /// First angle.
        first: f64,
        /// Second angle, used by the two-axis forms.
        second: f64,
    },
    /// 2D shear.
    Shear {
        /// Horizontal factor.
        x: f64,
        /// Vertical factor.
        y: f64,
    },
    /// Full row-major matrix.
    Transform([f64; 16]),
    /// Fill color, one or four corners.
    Color(SmallVec<[Rgb; 4]>),
    /// Fill opacity, one or four corners.
    Alpha(SmallVec<[f64; 4]>),
    /// Stroke color.
    LineColor(Rgb),
    /// Stroke opacity.
    LineAlpha(f64),
    /// Texture file; empty disables texturing.
    Texture(String),
    /// Texture offset and wrap.
    TexFill {
        /// x offset.
        x: f64,
        /// y offset.
        y: f64,
        /// Wrap mode.
        wrap: TextureWrap,
    },
    /// Blend operator.
    Blend(BlendOp),
    /// Blur strengths.
    Blur {
        /// Horizontal strength.
        h: f64,
        /// Vertical strength.
        v: f64,
    },
    /// Stencil operation.
    Stencil(StencilMode),
    /// Anti-aliasing switch.
    AntiAliasing(bool),
    /// Fade durations in ms.
    Fade {
        /// Fade-in duration.
        fade_in: TimeMs,
        /// Fade-out duration.
        fade_out: TimeMs,
    },
    /// Animated nested tags.
    Animate(Box<Animation>),
    /// Next karaoke syllable duration in ms.
    Karaoke(TimeMs),
    /// Absolute karaoke cursor in ms.
    KaraokeSet(TimeMs),
    /// Karaoke highlight color.
    KaraokeColor(Rgb),
    /// Karaoke effect.
    KaraokeMode(KaraokeMode),
}

impl Tag {
    /// `true` for tags whose effect depends on the query time.
    pub fn is_time_dependent(&self) -> bool {
        matches!(self, Self::Animate(_) | Self::Karaoke(_) | Self::KaraokeSet(_))
    }
}

/// Split `s` on `sep` outside parentheses.
pub(crate) fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                out.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

/// Parse the contents of one `{...}` block.
///
/// Every `;`-separated entry yields its own result so callers can skip bad tags individually.
pub fn parse_tag_block(block: &str) -> Vec<SsbResult<Tag>> {
    split_top_level(block, ';')
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((name, value)) => parse_tag(name.trim(), Some(value.trim())),
            None => parse_tag(entry, None),
        })
        .collect()
}

/// Parse a single `name=value` tag.
pub fn parse_tag(name: &str, value: Option<&str>) -> SsbResult<Tag> {
    parse_tag_nested(name, value, true)
}

fn parse_tag_nested(name: &str, value: Option<&str>, allow_animate: bool) -> SsbResult<Tag> {
    if name == "identity" {
        return match value {
            None | Some("") => Ok(Tag::Identity),
            Some(v) => Err(SsbError::parse(format!("identity takes no value, got \"{v}\""))),
        };
    }
    let v = value.ok_or_else(|| SsbError::parse(format!("tag \"{name}\" needs a value")))?;

    Ok(match name {
        "font-family" => Tag::FontFamily(v.to_owned()),
        "font-style" => Tag::FontStyle(font_style(v)?),
        "font-size" => Tag::FontSize(non_negative(v)?),
        "font-space" => {
            let [h, v] = one_or_two(v)?;
            Tag::FontSpace {
                h: Some(h),
                v: Some(v),
            }
        }
        "font-space-h" => Tag::FontSpace {
            h: Some(number(v)?),
            v: None,
        },
        "font-space-v" => Tag::FontSpace {
            h: None,
            v: Some(number(v)?),
        },
        "line-width" => Tag::LineWidth(non_negative(v)?),
        "line-style" => {
            let [join, cap] = exact::<2>(v)?;
            Tag::LineStyle {
                join: join.parse()?,
                cap: cap.parse()?,
            }
        }
        "line-dash" => {
            let values = numbers(v)?;
            let (offset, dashes) = values
                .split_first()
                .ok_or_else(|| SsbError::parse("line-dash needs an offset"))?;
            if dashes.iter().any(|d| *d < 0.0) || (!dashes.is_empty() && dashes.iter().all(|d| *d == 0.0)) {
                return Err(SsbError::parse(format!("invalid dash pattern \"{v}\"")));
            }
            Tag::LineDash {
                offset: *offset,
                dashes: dashes.iter().copied().collect(),
            }
        }
        "geometry" => Tag::Geometry(v.parse()?),
        "mode" => Tag::Mode(v.parse()?),
        "deform" => {
            let parts = split_top_level(v, ',');
            let [x, y] = parts.as_slice() else {
                return Err(SsbError::parse(format!("deform needs two formulas, got \"{v}\"")));
            };
            Formula::compile(x)?;
            Formula::compile(y)?;
            Tag::Deform {
                x: x.trim().to_owned(),
                y: y.trim().to_owned(),
            }
        }
        "position" => {
            if v.is_empty() {
                Tag::Position(None)
            } else {
                let [x, y] = exact_numbers::<2>(v)?;
                Tag::Position(Some(Point::new(x, y)))
            }
        }
        "alignment" => match v.parse::<u8>() {
            Ok(a @ 1..=9) => Tag::Alignment(a),
            _ => return Err(SsbError::parse(format!("invalid alignment \"{v}\""))),
        },
        "margin" => {
            let [h, v] = one_or_two(v)?;
            Tag::Margin {
                h: Some(h),
                v: Some(v),
            }
        }
        "margin-h" => Tag::Margin {
            h: Some(number(v)?),
            v: None,
        },
        "margin-v" => Tag::Margin {
            h: None,
            v: Some(number(v)?),
        },
        "direction" => Tag::Direction(v.parse()?),
        "translate" => {
            let [x, y, z] = two_or_three(v, 0.0)?;
            Tag::Translate { x, y, z }
        }
        "scale" => {
            let [x, y, z] = two_or_three(v, 1.0)?;
            Tag::Scale { x, y, z }
        }
        "rotate" => {
            let parts: Vec<&str> = v.split(',').map(str::trim).collect();
            let axis: RotateAxis = parts.first().copied().unwrap_or_default().parse()?;
            let two_axes = matches!(axis, RotateAxis::Xy | RotateAxis::Yx);
            match (two_axes, parts.as_slice()) {
                (false, [_, a]) => Tag::Rotate {
                    axis,
                    first: number(a)?,
                    second: 0.0,
                },
                (true, [_, a, b]) => Tag::Rotate {
                    axis,
                    first: number(a)?,
                    second: number(b)?,
                },
                _ => return Err(SsbError::parse(format!("invalid rotation \"{v}\""))),
            }
        }
        "shear" => {
            let [x, y] = exact_numbers::<2>(v)?;
            Tag::Shear { x, y }
        }
        "transform" => Tag::Transform(transform_matrix(v)?),
        "color" => {
            let colors = v
                .split(',')
                .map(|c| hex_color(c.trim()))
                .collect::<SsbResult<SmallVec<[Rgb; 4]>>>()?;
            if !matches!(colors.len(), 1 | 4) {
                return Err(SsbError::parse("color takes 1 or 4 values"));
            }
            Tag::Color(colors)
        }
        "alpha" => {
            let alphas = v
                .split(',')
                .map(|a| hex_alpha(a.trim()))
                .collect::<SsbResult<SmallVec<[f64; 4]>>>()?;
            if !matches!(alphas.len(), 1 | 4) {
                return Err(SsbError::parse("alpha takes 1 or 4 values"));
            }
            Tag::Alpha(alphas)
        }
        "line-color" => Tag::LineColor(hex_color(v)?),
        "line-alpha" => Tag::LineAlpha(hex_alpha(v)?),
        "texture" => Tag::Texture(v.to_owned()),
        "texfill" => {
            let parts: Vec<&str> = v.split(',').map(str::trim).collect();
            let (x, y, wrap) = match parts.as_slice() {
                [x, y] => (number(x)?, number(y)?, TextureWrap::Clamp),
                [x, y, w] => (number(x)?, number(y)?, w.parse()?),
                _ => return Err(SsbError::parse(format!("invalid texfill \"{v}\""))),
            };
            Tag::TexFill { x, y, wrap }
        }
        "blend" => Tag::Blend(v.parse()?),
        "blur" => {
            let [h, v] = one_or_two(v)?;
            if h < 0.0 || v < 0.0 {
                return Err(SsbError::parse("blur strengths must not be negative"));
            }
            Tag::Blur { h, v }
        }
        "stencil" => Tag::Stencil(v.parse()?),
        "anti-aliasing" => Tag::AntiAliasing(match v {
            "on" | "true" => true,
            "off" | "false" => false,
            _ => return Err(SsbError::parse(format!("invalid anti-aliasing \"{v}\""))),
        }),
        "fade" => {
            let parts: Vec<&str> = v.split(',').map(str::trim).collect();
            let (fade_in, fade_out) = match parts.as_slice() {
                [both] => (millis(both)?, millis(both)?),
                [i, o] => (millis(i)?, millis(o)?),
                _ => return Err(SsbError::parse(format!("invalid fade \"{v}\""))),
            };
            Tag::Fade { fade_in, fade_out }
        }
        "animate" if allow_animate => Tag::Animate(Box::new(animation(v)?)),
        "animate" => return Err(SsbError::parse("animate cannot be nested")),
        "karaoke" => Tag::Karaoke(millis(v)?),
        "karaoke-set" => Tag::KaraokeSet(millis(v)?),
        "karaoke-color" => Tag::KaraokeColor(hex_color(v)?),
        "karaoke-mode" => Tag::KaraokeMode(v.parse()?),
        other => return Err(SsbError::parse(format!("unknown tag \"{other}\""))),
    })
}

fn animation(v: &str) -> SsbResult<Animation> {
    let invalid = || SsbError::parse(format!("invalid animate \"{v}\""));
    let body = v.strip_suffix(')').ok_or_else(invalid)?;

    let mut depth = 0usize;
    let mut open = None;
    for (i, c) in body.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' if depth == 0 => {
                open = Some(i);
                break;
            }
            '(' => depth -= 1,
            _ => {}
        }
    }
    let open = open.ok_or_else(invalid)?;
    let tag_list = &body[open + 1..];
    let prefix = body[..open].trim();

    let params: Vec<&str> = if prefix.is_empty() {
        Vec::new()
    } else {
        let prefix = prefix.strip_suffix(',').ok_or_else(invalid)?;
        split_top_level(prefix, ',').into_iter().map(str::trim).collect()
    };
    let offset = |s: &str| s.parse::<i64>().map_err(|_| invalid());
    let (start, end, formula) = match params.as_slice() {
        [] => (None, None, None),
        [f] => (None, None, Some(*f)),
        [a, b] => (Some(offset(a)?), Some(offset(b)?), None),
        [a, b, f] => (Some(offset(a)?), Some(offset(b)?), Some(*f)),
        _ => return Err(invalid()),
    };
    if let Some(f) = formula {
        Formula::compile(f)?;
    }

    let tags = split_top_level(tag_list, ';')
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((name, value)) => parse_tag_nested(name.trim(), Some(value.trim()), false),
            None => parse_tag_nested(entry, None, false),
        })
        .collect::<SsbResult<Vec<_>>>()?;

    Ok(Animation {
        start,
        end,
        formula: formula.map(str::to_owned),
        tags,
    })
}

fn font_style(v: &str) -> SsbResult<FontStyle> {
    let mut style = FontStyle::default();
    for c in v.chars() {
        match c {
            'b' => style.bold = true,
            'i' => style.italic = true,
            'u' => style.underline = true,
            's' => style.strikeout = true,
            other => {
                return Err(SsbError::parse(format!("invalid font style flag '{other}'")));
            }
        }
    }
    Ok(style)
}

fn number(s: &str) -> SsbResult<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SsbError::parse(format!("invalid number \"{s}\"")))
}

fn non_negative(s: &str) -> SsbResult<f64> {
    let v = number(s)?;
    if v < 0.0 {
        return Err(SsbError::parse(format!("value must not be negative, got \"{s}\"")));
    }
    Ok(v)
}

fn millis(s: &str) -> SsbResult<TimeMs> {
    s.trim()
        .parse::<TimeMs>()
        .map_err(|_| SsbError::parse(format!("invalid duration \"{s}\"")))
}

fn numbers(s: &str) -> SsbResult<SmallVec<[f64; 16]>> {
    s.split(',').map(number).collect()
}

fn exact<const N: usize>(s: &str) -> SsbResult<[&str; N]> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    <[&str; N]>::try_from(parts)
        .map_err(|_| SsbError::parse(format!("expected {N} values, got \"{s}\"")))
}

fn exact_numbers<const N: usize>(s: &str) -> SsbResult<[f64; N]> {
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(exact::<N>(s)?) {
        *slot = number(part)?;
    }
    Ok(out)
}

fn one_or_two(s: &str) -> SsbResult<[f64; 2]> {
    match numbers(s)?.as_slice() {
        [a] => Ok([*a, *a]),
        [a, b] => Ok([*a, *b]),
        _ => Err(SsbError::parse(format!("expected 1 or 2 values, got \"{s}\""))),
    }
}

fn two_or_three(s: &str, z_default: f64) -> SsbResult<[f64; 3]> {
    match numbers(s)?.as_slice() {
        [x, y] => Ok([*x, *y, z_default]),
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(SsbError::parse(format!("expected 2 or 3 values, got \"{s}\""))),
    }
}

/// `m00,m01,m10,m11,tx,ty` or 16 row-major values.
fn transform_matrix(s: &str) -> SsbResult<[f64; 16]> {
    let v = numbers(s)?;
    match v.as_slice() {
        [a, b, c, d, tx, ty] => Ok([
            *a, *b, 0.0, *tx, //
            *c, *d, 0.0, *ty, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]),
        all if all.len() == 16 => {
            let mut m = [0.0; 16];
            m.copy_from_slice(all);
            Ok(m)
        }
        _ => Err(SsbError::parse(format!("transform takes 6 or 16 values, got \"{s}\""))),
    }
}

fn hex_byte(s: &str) -> Option<f64> {
    if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(s, 16).ok().map(|b| f64::from(b) / 255.0)
}

fn hex_color(s: &str) -> SsbResult<Rgb> {
    let channel = |i: usize| s.get(i..i + 2).and_then(hex_byte);
    match (s.len(), channel(0), channel(2), channel(4)) {
        (6, Some(r), Some(g), Some(b)) => Ok([r, g, b]),
        _ => Err(SsbError::parse(format!("invalid color \"{s}\""))),
    }
}

fn hex_alpha(s: &str) -> SsbResult<f64> {
    hex_byte(s).ok_or_else(|| SsbError::parse(format!("invalid alpha \"{s}\"")))
}

#[cfg(test)]
#[path = "../../tests/unit/script/tags.rs"]
mod tests;
