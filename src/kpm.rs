use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // KPM-<admission year>-<diploma year><semester>-<sequence>, separators
    // optional because older codes were generated without them.
    static ref KPM_RE: Regex =
        Regex::new(r"(?i)^KPM-?(\d{4})-?([1-3])([12])-?(\d{1,4})$").unwrap();
}

/// Parsed form of the locally generated student code, e.g. `KPM-2023-12-0042`:
/// admitted 2023, diploma year 1, semester 2, sequence 42.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KpmNo {
    pub admission_year: i32,
    pub diploma_year: i32,
    pub semester: i32,
    pub sequence: u32,
}

impl KpmNo {
    pub fn parse(raw: &str) -> Option<KpmNo> {
        let caps = KPM_RE.captures(raw.trim())?;
        Some(KpmNo {
            admission_year: caps[1].parse().ok()?,
            diploma_year: caps[2].parse().ok()?,
            semester: caps[3].parse().ok()?,
            sequence: caps[4].parse().ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_form() {
        let kpm = KpmNo::parse("KPM-2023-12-0042").expect("canonical form");
        assert_eq!(kpm.admission_year, 2023);
        assert_eq!(kpm.diploma_year, 1);
        assert_eq!(kpm.semester, 2);
        assert_eq!(kpm.sequence, 42);
    }

    #[test]
    fn parses_separatorless_and_lowercase_forms() {
        let kpm = KpmNo::parse("kpm202331007").expect("compact form");
        assert_eq!(kpm.admission_year, 2023);
        assert_eq!(kpm.diploma_year, 3);
        assert_eq!(kpm.semester, 1);
        assert_eq!(kpm.sequence, 7);

        assert_eq!(KpmNo::parse(" KPM-2024-21-3 "), KpmNo::parse("kpm2024213"));
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(KpmNo::parse("").is_none());
        assert!(KpmNo::parse("KPM-2023").is_none());
        // Diploma year outside 1..=3.
        assert!(KpmNo::parse("KPM-2023-42-0042").is_none());
        // Semester outside 1..=2.
        assert!(KpmNo::parse("KPM-2023-13-0042").is_none());
        assert!(KpmNo::parse("ABC-2023-12-0042").is_none());
    }
}
