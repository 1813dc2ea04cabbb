//! Field extraction from a profile page.
//!
//! Every field has its own rule over the visible text lines and fails soft:
//! a rule that finds nothing leaves the field empty, and a rule that finds
//! something oddly shaped records a [`ParseAmbiguityWarning`].

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::warn;

use super::fetch::Fetcher;
use crate::error::{FetchError, ParseAmbiguityWarning};
use crate::record::RawRecord;
use crate::text::PageText;
use crate::utils::{collapse_whitespace, contains_word, contains_word_exact};

static NAME_HEADING: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2[class*='name'], div[class*='doctor-name'], div[class*='profile'] h2").unwrap()
});

const MAX_NAME_CHARS: usize = 100;
const MAX_QUALIFICATION_CHARS: usize = 250;
const MAX_HOSPITAL_CHARS: usize = 200;

const HONORIFICS: &[&str] = &["Dr.", "Prof.", "Assoc.", "Asst."];

/// Degree and certification tokens, matched as whole words in their own case.
const DEGREES: &[&str] = &[
    "MBBS", "BDS", "FCPS", "MD", "MS", "FRCS", "MRCP", "MCPS", "BCS", "MPH", "MPhil", "PhD", "DM",
    "MCh", "DNB", "FRCOG", "MRCOG", "FACS", "DOMS", "DO", "DCH", "DGO", "DA", "Diploma",
    "Fellowship", "FACC", "FRCP", "FICS", "MNAMS",
];

/// Lines carrying any of these are never read as qualifications.
const NOT_QUALIFICATION: &[&str] = &[
    "Years of Experience", "Experience Overall", "Doctor Reg", "BMDC", "Specialist", "Surgeon",
    "Consultant", "Hospital", "Medical Centre", "Clinic", "Get Direction", "Book Appointment",
    "Dhaka", "Bangladesh", "India",
];

const QUALIFICATION_LABELS: &[&str] = &["Qualifications:", "Degrees:", "Education:"];

const SPECIALTY_KEYWORDS: &[&str] = &[
    "Rheumatologist", "Cardiologist", "Neurologist", "Dermatologist", "Nephrologist", "Oncologist",
    "Endocrinologist", "Gastroenterologist", "Pulmonologist", "Hematologist", "Radiologist",
    "Pathologist", "Anesthesiologist", "Ophthalmologist", "Neonatologist", "Gynecologist",
    "Urologist", "Immunologist", "Pediatrician", "Obstetrician", "Psychiatrist", "Dentist", "ENT",
    "Specialist", "Medicine Specialist", "Chest Specialist", "Respiratory Specialist",
    "Critical Care Medicine Specialist", "Diabetes Specialist", "Family Medicine Specialist",
    "Surgeon", "General Surgeon", "Neurosurgeon", "Cardiovascular Surgeon", "Thoracic Surgeon",
    "Vascular Surgeon", "Plastic Surgeon", "Colorectal Surgeon", "Hepatobiliary Surgeon",
    "Orthopedic Surgeon", "Maxillofacial Surgeon", "Dental Surgeon",
];

const NOT_SPECIALTY: &[&str] = &[
    "Years", "Hospital", "Dhaka", "Bangladesh", "India", "Book", "Get", "Find", "View", "Doctor",
];

const SPECIALTY_SUFFIXES: &[&str] = &["logist", "ist", "ian", "Specialist", "Surgeon", "Consultant"];

const EXPERIENCE_MARKERS: &[&str] = &["Years of Experience", "Year of Experience", "Experience Overall"];

const INSTITUTIONS: &[&str] = &[
    "Hospital", "Medical Centre", "Medical Center", "Clinic", "Healthcare", "Medical College",
];

/// Site chrome that mentions institutions without being one.
const NAVIGATION: &[&str] = &[
    "Find Hospital", "Get Direction", "Book Appointment", "Availability", "Work Experience",
    "Education", "Locations", "View all", "Info",
];

const NAVIGATION_PREFIXES: &[&str] = &["Book", "View", "Find", "Get"];

const ADDRESS_HINTS: &[&str] = &[
    ",", "Road", "Rd", "Dhaka", "Bangladesh", "India", "No.", "Street", "Avenue", "Chittagong",
    "Sylhet", "Rajshahi", "Khulna", "Barisal", "Mumbai", "Delhi", "Bangalore", "Kolkata",
    "Chennai", "Hyderabad", "City", "Building", "Circular",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileExtraction {
    pub record: RawRecord,
    pub warnings: Vec<ParseAmbiguityWarning>,
}

/// Fetch `reference` and extract its fields. Ambiguities are logged, not
/// returned.
pub fn fetch_profile<F: Fetcher + ?Sized>(fetcher: &F, reference: &str) -> Result<RawRecord, FetchError> {
    let html = fetcher.fetch(reference)?;
    let ProfileExtraction { record, warnings } = parse_profile(reference, &html);
    for w in &warnings {
        warn!(profile = reference, field = w.field, "{}", w.detail);
    }
    Ok(record)
}

pub fn parse_profile(reference: &str, html: &str) -> ProfileExtraction {
    let doc = Html::parse_document(html);
    let text = PageText::from_document(&doc);
    let mut warnings = Vec::new();

    let mut record = RawRecord::new(reference);
    record.name = extract_name(&doc, &text, &mut warnings).unwrap_or_default();
    record.qualifications = extract_qualifications(&text, &mut warnings);
    record.specialty = extract_specialty(&text, &record.name).unwrap_or_default();
    record.experience_raw = extract_experience(&text).unwrap_or_default();
    let (hospital, location) = extract_hospital_location(&text, &mut warnings);
    record.hospital = hospital.unwrap_or_default();
    record.location = location.unwrap_or_default();

    ProfileExtraction { record, warnings }
}

fn has_any(line: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| line.contains(n))
}

fn has_degree(line: &str) -> bool {
    DEGREES.iter().any(|d| contains_word_exact(line, d))
}

fn extract_name(doc: &Html, text: &PageText, warnings: &mut Vec<ParseAmbiguityWarning>) -> Option<String> {
    if let Some(heading) = doc.select(&NAME_HEADING).next() {
        let name = collapse_whitespace(&heading.text().collect::<String>());
        let chars = name.chars().count();
        if chars > 0 && chars < MAX_NAME_CHARS {
            return Some(name);
        }
        if chars >= MAX_NAME_CHARS {
            warnings.push(ParseAmbiguityWarning::new(
                "name",
                format!("heading of {chars} chars ignored"),
            ));
        }
    }

    text.first_in_head(10, |line| {
        has_any(line, HONORIFICS)
            && line.chars().count() < MAX_NAME_CHARS
            && !has_any(line, &["MBBS", "FCPS", "Experience", "Specialist"])
    })
    .map(str::to_string)
}

fn extract_qualifications(text: &PageText, warnings: &mut Vec<ParseAmbiguityWarning>) -> String {
    let mut found: Vec<String> = Vec::new();

    for line in text.head(30) {
        if has_any(line, NOT_QUALIFICATION) || !has_degree(line) {
            continue;
        }
        // "Dr. A. Karim, MBBS" is a title line, not a degree list
        if has_any(line, HONORIFICS) && line.chars().count() < 50 {
            continue;
        }
        let cleaned = QUALIFICATION_LABELS
            .iter()
            .find_map(|label| line.strip_prefix(label))
            .unwrap_or(line.as_str())
            .trim();
        let chars = cleaned.chars().count();
        if chars >= MAX_QUALIFICATION_CHARS {
            warnings.push(ParseAmbiguityWarning::new(
                "qualifications",
                format!("line of {chars} chars skipped"),
            ));
            continue;
        }
        if chars > 3 && !found.iter().any(|f| f == cleaned) {
            found.push(cleaned.to_string());
        }
    }

    collapse_whitespace(&found.join(", "))
        .replace(" ,", ",")
        .replace(",,", ",")
}

fn extract_specialty(text: &PageText, name: &str) -> Option<String> {
    let by_keyword = text.first_in_head(15, |line| {
        if has_any(line, NOT_SPECIALTY) || has_degree(line) {
            return false;
        }
        SPECIALTY_KEYWORDS.iter().any(|k| {
            line.eq_ignore_ascii_case(k) || (contains_word(line, k) && line.chars().count() < 100)
        })
    });
    if let Some(line) = by_keyword {
        return Some(line.to_string());
    }

    text.first_in_head(20, |line| {
        let chars = line.chars().count();
        chars > 5
            && chars < 40
            && line.chars().next().is_some_and(char::is_uppercase)
            && line != name
            && SPECIALTY_SUFFIXES.iter().any(|s| line.ends_with(s))
            && !has_any(line, &["MBBS", "FCPS", "Years", "Hospital"])
    })
    .map(str::to_string)
}

fn extract_experience(text: &PageText) -> Option<String> {
    text.first_in_head(30, |line| has_any(line, EXPERIENCE_MARKERS))
        .map(str::to_string)
}

fn is_institution(line: &str) -> bool {
    has_any(line, INSTITUTIONS)
        && !has_any(line, NAVIGATION)
        && !NAVIGATION_PREFIXES.iter().any(|p| line.starts_with(p))
        && line.chars().count() > 5
        && line.chars().count() < MAX_HOSPITAL_CHARS
}

fn looks_like_address(line: &str) -> bool {
    line.chars().count() > 15
        && !has_any(line, &["Get Direction", "Book Appointment", "Availability", "Find Hospital", "Info"])
        && has_any(line, ADDRESS_HINTS)
}

/// First institution line, and the first address-like line among the four
/// after it.
fn extract_hospital_location(
    text: &PageText,
    warnings: &mut Vec<ParseAmbiguityWarning>,
) -> (Option<String>, Option<String>) {
    let lines = text.lines();
    let Some(idx) = lines.iter().position(|l| is_institution(l)) else {
        return (None, None);
    };
    let hospital = lines[idx].clone();
    let location = lines
        .iter()
        .skip(idx + 1)
        .take(4)
        .find(|l| looks_like_address(l))
        .cloned();
    if location.is_none() {
        warnings.push(ParseAmbiguityWarning::new(
            "location",
            format!("no address line after '{hospital}'"),
        ));
    }
    (Some(hospital), location)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "https://sasthyaseba.com/doctors/dr-rahim-uddin";

    #[test]
    fn full_profile_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/profile_page.html").unwrap();
        let ProfileExtraction { record, warnings } = parse_profile(REFERENCE, &html);
        assert_eq!(record.profile_reference, REFERENCE);
        assert_eq!(record.name, "Dr. Rahim Uddin");
        assert_eq!(record.qualifications, "MBBS, FCPS (Medicine), MD (Cardiology)");
        assert_eq!(record.specialty, "Cardiologist");
        assert_eq!(record.experience_raw, "15 Years of Experience");
        assert_eq!(record.hospital, "Square Hospital Ltd.");
        assert_eq!(
            record.location,
            "18/F, Bir Uttam Qazi Nuruzzaman Sarak, West Panthapath, Dhaka 1205, Bangladesh"
        );
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn sparse_profile_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/profile_minimal.html").unwrap();
        let ProfileExtraction { record, warnings } = parse_profile(REFERENCE, &html);
        assert_eq!(record.name, "Prof. Anika Rahman");
        assert_eq!(record.specialty, "Dental Surgeon");
        assert_eq!(record.hospital, "Ibn Sina Diagnostic Clinic");
        assert!(record.qualifications.is_empty());
        assert!(record.experience_raw.is_empty());
        assert!(record.location.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "location");
    }

    #[test]
    fn oversize_heading_falls_back_to_lines() {
        let long = "x".repeat(150);
        let html = format!("<html><body><h1>{long}</h1><p>Dr. Karim Ahmed</p></body></html>");
        let out = parse_profile(REFERENCE, &html);
        assert_eq!(out.record.name, "Dr. Karim Ahmed");
        assert_eq!(out.warnings[0].field, "name");
    }

    #[test]
    fn empty_page_yields_empty_fields() {
        let out = parse_profile(REFERENCE, "<html><body></body></html>");
        assert_eq!(out.record, RawRecord::new(REFERENCE));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn qualifications_keep_every_degree_line() {
        let text = PageText::from_raw(
            "Dr. A. Karim, MBBS\nQualifications: MBBS, BCS (Health)\nFCPS (Surgery), FRCS\nMBBS, BCS (Health)\nDo not miss",
        );
        let mut warnings = Vec::new();
        assert_eq!(
            extract_qualifications(&text, &mut warnings),
            "MBBS, BCS (Health), FCPS (Surgery), FRCS"
        );
    }

    #[test]
    fn specialty_suffix_fallback() {
        let text = PageText::from_raw("Dr. Nila Sen\nHome\nChild Psychologist");
        assert_eq!(extract_specialty(&text, "Dr. Nila Sen").as_deref(), Some("Child Psychologist"));
    }
}
