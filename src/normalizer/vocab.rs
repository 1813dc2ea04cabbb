//! Fixed vocabularies the normalizer maps free text onto.
//!
//! Declaration order is the tie-break: the first entry whose name or synonym
//! appears in the text wins. Compound names ("Pediatric Cardiologist",
//! "Dental Surgeon") are therefore declared before the generic names they
//! contain ("Cardiologist", "Surgeon"), and catch-alls come last.

use crate::utils::{contains_word, is_blank};

/// (standard name, synonyms). The name itself always counts as a synonym.
const STANDARD_SPECIALTIES: &[(&str, &[&str])] = &[
    ("Pediatric Cardiologist", &["paediatric cardiologist", "pediatric cardiology", "paediatric cardiology", "child cardiologist"]),
    ("Interventional Cardiologist", &["interventional cardiology"]),
    ("Cardiothoracic Surgeon", &["cardiothoracic surgery", "cardio thoracic surgeon", "cardiovascular surgeon", "cardiovascular surgery", "ctvs"]),
    ("Cardiac Surgeon", &["cardiac surgery", "heart surgeon"]),
    ("Cardiologist", &["cardiology", "cardiac specialist", "heart specialist", "cardiac medicine"]),
    ("Gynecologic Oncologist", &["gynaecologic oncologist", "gynae oncologist", "gynecological oncology", "gynaecological oncology"]),
    ("Oncologist", &["oncology", "cancer specialist", "clinical oncologist", "radiation oncologist"]),
    ("Andrologist", &["andrology", "male infertility", "men's health"]),
    ("Infertility Specialist", &["infertility", "fertility specialist", "reproductive medicine", "ivf specialist"]),
    ("Gynecologist", &["gynaecologist", "gynecology", "gynaecology", "gynae", "obgyn", "ob/gyn"]),
    ("Obstetrician", &["obstetrics", "maternity specialist"]),
    ("Aesthetic Dermatologist", &["aesthetic dermatology", "cosmetic dermatologist"]),
    ("Dermatosurgeon", &["dermatosurgery", "dermato surgeon", "dermatologic surgeon"]),
    ("Hair Transplant Surgeon", &["hair transplant", "hair restoration"]),
    ("Allergy Skin-VD", &["allergy skin", "allergy & skin", "allergy and skin", "venereologist", "venereology"]),
    ("Dermatologist", &["dermatology", "skin specialist", "skin & vd", "skin and vd", "skin-vd"]),
    ("Cosmetic Dentist", &["cosmetic dentistry", "aesthetic dentist"]),
    ("Cosmetologist", &["cosmetology", "cosmetic physician", "aesthetic physician"]),
    ("Maxillofacial Surgeon", &["oral & maxillofacial", "oral and maxillofacial", "maxillofacial surgery", "oral surgeon"]),
    ("Dentist", &["dental surgeon", "dental", "dentistry", "orthodontist", "endodontist", "prosthodontist", "periodontist"]),
    ("Neurosurgeon", &["neurosurgery", "neuro surgeon", "brain surgeon", "brain & spine surgeon"]),
    ("Spine Surgeon", &["spine surgery", "spinal surgeon"]),
    ("Neurologist", &["neurology", "neuromedicine", "neuro medicine", "brain specialist", "nerve specialist", "stroke specialist"]),
    ("Pediatric Surgeon", &["paediatric surgeon", "pediatric surgery", "paediatric surgery", "child surgeon"]),
    ("Neonatologist", &["neonatology", "newborn specialist"]),
    ("Pediatrician", &["paediatrician", "pediatrics", "paediatrics", "child specialist", "child health"]),
    ("Hepatobiliary Surgeon", &["hepatobiliary surgery", "hpb surgeon", "hepato-biliary", "liver transplant surgeon"]),
    ("Colorectal Surgeon", &["colorectal surgery", "colorectal", "proctologist", "piles specialist"]),
    ("Laparoscopic Surgeon", &["laparoscopic surgery", "laparoscopic"]),
    ("Laparoscopist", &[]),
    ("Plastic Surgeon", &["plastic surgery", "reconstructive surgeon", "burn surgeon", "burn & plastic"]),
    ("Thoracic Surgeon", &["thoracic surgery", "chest surgeon"]),
    ("Orthopedic Surgeon", &["orthopaedic surgeon", "orthopedic surgery", "orthopaedic surgery", "orthopedics", "orthopaedics", "bone specialist", "bone & joint", "trauma surgeon", "joint replacement"]),
    ("Orthopedist", &["orthopaedist", "orthopedic specialist", "orthopaedic specialist"]),
    ("Urologist", &["urology", "urosurgeon", "uro surgeon"]),
    ("Nephrologist", &["nephrology", "kidney specialist", "kidney diseases"]),
    ("Gastroenterologist", &["gastroenterology", "gastro-enterologist", "gastrointestinal", "gastro liver", "gastro specialist"]),
    ("Hepatologist", &["hepatology", "liver specialist", "liver diseases"]),
    ("Pulmonologist", &["pulmonology", "respiratory medicine", "respiratory specialist", "lung specialist", "pulmonary medicine"]),
    ("Chest Specialist", &["chest medicine", "chest disease", "chest diseases", "asthma specialist"]),
    ("Critical Care Specialist", &["critical care", "intensive care", "icu specialist", "intensivist"]),
    ("Anesthesiologist", &["anaesthesiologist", "anesthesiology", "anaesthesiology", "anesthetist", "anaesthetist", "anesthesia", "anaesthesia"]),
    ("Pain Management Specialist", &["pain management", "pain medicine", "pain specialist", "pain physician"]),
    ("Endocrinologist", &["endocrinology", "hormone specialist", "thyroid specialist", "endocrine"]),
    ("Diabetologist", &["diabetology"]),
    ("Diabetes Specialist", &["diabetes", "diabetic specialist"]),
    ("Hematologist", &["haematologist", "hematology", "haematology", "blood specialist"]),
    ("Rheumatologist", &["rheumatology", "arthritis specialist", "rheumatic"]),
    ("Immunologist", &["immunology", "allergy specialist", "allergist"]),
    ("Psychiatrist", &["psychiatry", "psychiatric", "mental health specialist"]),
    ("Psychologist", &["psychology", "counsellor", "counselor", "psychotherapist"]),
    ("Ophthalmologist", &["ophthalmology", "eye specialist", "eye surgeon", "eye diseases", "retina specialist", "cornea specialist", "glaucoma specialist"]),
    ("ENT", &["ent specialist", "ent surgeon", "otolaryngologist", "otolaryngology", "otorhinolaryngologist", "ear, nose", "ear nose and throat", "ear nose & throat", "head & neck surgeon"]),
    ("Radiologist", &["radiology", "imaging specialist", "medical imaging"]),
    ("Sonologist", &["sonology", "ultrasonologist", "ultrasound specialist", "sonographer"]),
    ("Pathologist", &["pathology", "histopathologist", "clinical pathologist"]),
    ("Microbiologist", &["microbiology", "virologist", "virology"]),
    ("Biochemist", &["biochemistry", "clinical biochemist"]),
    ("Epidemiologist", &["epidemiology", "public health specialist"]),
    ("Clinical Nutritionist", &["clinical nutrition"]),
    ("Nutritionist", &["nutrition specialist", "nutrition"]),
    ("Dietician", &["dietitian", "dietetics", "diet specialist"]),
    ("Physical Medicine", &["physical medicine & rehabilitation", "rehabilitation medicine", "physiatrist", "rehabilitation specialist"]),
    ("Physiotherapist", &["physiotherapy", "physical therapist", "physio therapist"]),
    ("Sexual Medicine Specialist", &["sexual medicine", "sexologist", "sex specialist", "sexual health"]),
    ("Geriatrician", &["geriatrics", "geriatric medicine", "elderly care"]),
    ("Sports Physician", &["sports medicine", "sports injury"]),
    ("Family Medicine Specialist", &["family medicine", "family physician", "general practitioner", "gp"]),
    ("Internal Medicine Specialist", &["internist"]),
    ("Internal Medicine", &[]),
    ("Medicine Specialist", &["general medicine", "medicine consultant", "consultant physician"]),
    ("General Physician", &["physician", "general practice"]),
    ("General Surgeon", &["general surgery"]),
    ("Surgeon", &["surgery"]),
];

/// (canonical country, aliases found in location text).
const COUNTRIES: &[(&str, &[&str])] = &[
    ("Bangladesh", &["Bangladesh"]),
    ("India", &["India"]),
    ("Pakistan", &["Pakistan"]),
    ("Sri Lanka", &["Sri Lanka"]),
    ("Nepal", &["Nepal"]),
    ("United States", &["United States", "USA", "U.S.A."]),
    ("Canada", &["Canada"]),
    ("United Kingdom", &["United Kingdom", "UK", "U.K."]),
    ("Australia", &["Australia"]),
    ("Singapore", &["Singapore"]),
    ("Malaysia", &["Malaysia"]),
    ("Thailand", &["Thailand"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardSpecialty {
    pub name: String,
    pub synonyms: Vec<String>,
}

/// Ordered standard-specialty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialtyVocabulary {
    entries: Vec<StandardSpecialty>,
}

impl SpecialtyVocabulary {
    pub fn new(entries: Vec<StandardSpecialty>) -> Self {
        Self { entries }
    }

    pub fn standard() -> Self {
        Self::new(
            STANDARD_SPECIALTIES
                .iter()
                .map(|(name, synonyms)| StandardSpecialty {
                    name: name.to_string(),
                    synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        )
    }

    /// Exact (case-insensitive) name match first, then the first entry in
    /// declaration order whose name or a synonym occurs as whole words.
    pub fn classify(&self, raw: &str) -> Option<&str> {
        if is_blank(raw) {
            return None;
        }
        let text = raw.trim().to_lowercase();

        if let Some(e) = self.entries.iter().find(|e| e.name.to_lowercase() == text) {
            return Some(e.name.as_str());
        }

        self.entries
            .iter()
            .find(|e| {
                contains_word(&text, &e.name) || e.synonyms.iter().any(|s| contains_word(&text, s))
            })
            .map(|e| e.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryEntry {
    pub name: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryVocabulary {
    entries: Vec<CountryEntry>,
}

impl CountryVocabulary {
    pub fn new(entries: Vec<CountryEntry>) -> Self {
        Self { entries }
    }

    pub fn standard() -> Self {
        Self::new(
            COUNTRIES
                .iter()
                .map(|(name, aliases)| CountryEntry {
                    name: name.to_string(),
                    aliases: aliases.iter().map(|a| a.to_string()).collect(),
                })
                .collect(),
        )
    }

    /// Canonical country of the longest alias found in `location`. Equal
    /// lengths go to the earlier entry.
    pub fn find(&self, location: &str) -> Option<&str> {
        if is_blank(location) {
            return None;
        }
        let mut best: Option<(&str, usize)> = None;
        for entry in &self.entries {
            for alias in &entry.aliases {
                let len = alias.chars().count();
                if best.is_some_and(|(_, l)| l >= len) {
                    continue;
                }
                if contains_word(location, alias) {
                    best = Some((entry.name.as_str(), len));
                }
            }
        }
        best.map(|(name, _)| name)
    }
}
