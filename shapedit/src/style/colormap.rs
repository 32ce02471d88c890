//! Named colour ramps.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb([r, g, b])
    }

    const fn hex(value: u32) -> Self {
        Rgb([(value >> 16) as u8, (value >> 8) as u8, value as u8])
    }

    fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
        Rgb([mix(a.0[0], b.0[0]), mix(a.0[1], b.0[1]), mix(a.0[2], b.0[2])])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for Rgb {
    type Err = ValidationError;

    /// Parses `#rrggbb` or `rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        let invalid = || ValidationError::Invalid(format!("'{}' is not a #rrggbb colour", s));
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        u32::from_str_radix(digits, 16)
            .map(Rgb::hex)
            .map_err(|_| invalid())
    }
}

const VIRIDIS: [Rgb; 5] = [
    Rgb::hex(0x440154),
    Rgb::hex(0x3b528b),
    Rgb::hex(0x21918c),
    Rgb::hex(0x5ec962),
    Rgb::hex(0xfde725),
];
const PLASMA: [Rgb; 5] = [
    Rgb::hex(0x0d0887),
    Rgb::hex(0x7e03a8),
    Rgb::hex(0xcc4778),
    Rgb::hex(0xf89540),
    Rgb::hex(0xf0f921),
];
const COOLWARM: [Rgb; 5] = [
    Rgb::hex(0x3b4cc0),
    Rgb::hex(0x8db0fe),
    Rgb::hex(0xdddddd),
    Rgb::hex(0xf49a7b),
    Rgb::hex(0xb40426),
];
const REDS: [Rgb; 5] = [
    Rgb::hex(0xfff5f0),
    Rgb::hex(0xfcbba1),
    Rgb::hex(0xfb6a4a),
    Rgb::hex(0xcb181d),
    Rgb::hex(0x67000d),
];
const BLUES: [Rgb; 5] = [
    Rgb::hex(0xf7fbff),
    Rgb::hex(0xc6dbef),
    Rgb::hex(0x6baed6),
    Rgb::hex(0x2171b5),
    Rgb::hex(0x08306b),
];
const GREENS: [Rgb; 5] = [
    Rgb::hex(0xf7fcf5),
    Rgb::hex(0xc7e9c0),
    Rgb::hex(0x74c476),
    Rgb::hex(0x238b45),
    Rgb::hex(0x00441b),
];
const SET1: [Rgb; 9] = [
    Rgb::hex(0xe41a1c),
    Rgb::hex(0x377eb8),
    Rgb::hex(0x4daf4a),
    Rgb::hex(0x984ea3),
    Rgb::hex(0xff7f00),
    Rgb::hex(0xffff33),
    Rgb::hex(0xa65628),
    Rgb::hex(0xf781bf),
    Rgb::hex(0x999999),
];

/// Colour ramp applied to the colour-by column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Colormap {
    #[default]
    Viridis,
    Plasma,
    Coolwarm,
    Reds,
    Blues,
    Greens,
    /// Qualitative palette of nine colours.
    Set1,
}

impl Colormap {
    pub const ALL: [Colormap; 7] = [
        Colormap::Viridis,
        Colormap::Plasma,
        Colormap::Coolwarm,
        Colormap::Reds,
        Colormap::Blues,
        Colormap::Greens,
        Colormap::Set1,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Colormap::Viridis => "viridis",
            Colormap::Plasma => "plasma",
            Colormap::Coolwarm => "coolwarm",
            Colormap::Reds => "Reds",
            Colormap::Blues => "Blues",
            Colormap::Greens => "Greens",
            Colormap::Set1 => "Set1",
        }
    }

    /// The next ramp in [`Colormap::ALL`], wrapping around.
    pub fn next(&self) -> Colormap {
        let index = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    fn stops(&self) -> &'static [Rgb] {
        match self {
            Colormap::Viridis => &VIRIDIS,
            Colormap::Plasma => &PLASMA,
            Colormap::Coolwarm => &COOLWARM,
            Colormap::Reds => &REDS,
            Colormap::Blues => &BLUES,
            Colormap::Greens => &GREENS,
            Colormap::Set1 => &SET1,
        }
    }

    /// Colour at position `t` in `0.0..=1.0` (clamped).
    pub fn sample(&self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        if *self == Colormap::Set1 {
            let index = ((t * stops.len() as f64) as usize).min(stops.len() - 1);
            return stops[index];
        }
        let scaled = t * (stops.len() - 1) as f64;
        let lower = (scaled.floor() as usize).min(stops.len() - 2);
        Rgb::lerp(stops[lower], stops[lower + 1], scaled - lower as f64)
    }

    /// Colour for category `index` of `count` distinct values.
    pub fn category(&self, index: usize, count: usize) -> Rgb {
        if *self == Colormap::Set1 {
            return SET1[index % SET1.len()];
        }
        if count <= 1 {
            return self.sample(0.5);
        }
        self.sample(index as f64 / (count - 1) as f64)
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Colormap {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|c| c.name()).collect();
                ValidationError::Invalid(format!(
                    "Unknown colormap '{}' (choose from {})",
                    wanted,
                    names.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_endpoints() {
        assert_eq!(Colormap::Viridis.sample(0.0), VIRIDIS[0]);
        assert_eq!(Colormap::Viridis.sample(1.0), VIRIDIS[4]);
        assert_eq!(Colormap::Viridis.sample(0.5), VIRIDIS[2]);
    }

    #[test]
    fn test_sample_clamps() {
        assert_eq!(Colormap::Reds.sample(-3.0), REDS[0]);
        assert_eq!(Colormap::Reds.sample(7.0), REDS[4]);
        assert_eq!(Colormap::Reds.sample(f64::NAN), REDS[0]);
    }

    #[test]
    fn test_sample_interpolates() {
        let mid = Colormap::Blues.sample(0.125);
        let a = BLUES[0].0;
        let b = BLUES[1].0;
        for i in 0..3 {
            let (lo, hi) = (a[i].min(b[i]), a[i].max(b[i]));
            assert!(mid.0[i] >= lo && mid.0[i] <= hi);
        }
    }

    #[test]
    fn test_set1_is_discrete() {
        assert_eq!(Colormap::Set1.category(0, 3), SET1[0]);
        assert_eq!(Colormap::Set1.category(10, 12), SET1[1]);
        assert_eq!(Colormap::Set1.sample(1.0), SET1[8]);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("reds".parse::<Colormap>(), Ok(Colormap::Reds));
        assert_eq!("VIRIDIS".parse::<Colormap>(), Ok(Colormap::Viridis));
        assert!("jet".parse::<Colormap>().is_err());
    }

    #[test]
    fn test_next_wraps() {
        assert_eq!(Colormap::Viridis.next(), Colormap::Plasma);
        assert_eq!(Colormap::Set1.next(), Colormap::Viridis);
    }

    #[test]
    fn test_rgb_hex_round_trip() {
        let c: Rgb = "#1F77b4".parse().unwrap();
        assert_eq!(c, Rgb::new(0x1f, 0x77, 0xb4));
        assert_eq!(c.to_string(), "#1f77b4");
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("zzzzzz".parse::<Rgb>().is_err());
    }
}
