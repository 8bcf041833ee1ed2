use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// A single job posting. Read-only once loaded; one evaluation session works against one posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    #[serde(alias = "job_title")]
    pub title: String,
    #[serde(alias = "job_details")]
    pub description: String,
    pub requirements: String,
    pub experience: String,
    /// Accepts either a JSON array or a comma-separated string.
    #[serde(deserialize_with = "deserialize_skills")]
    pub skills: Vec<String>,
}

/// Response shape for `GET /api/v1/job-details`.
#[derive(Debug, Clone, Serialize)]
pub struct JobDetailsView {
    pub job_title: String,
    pub job_details: String,
    pub requirements: String,
    pub experience: String,
    pub skills: String,
}

impl JobDescription {
    /// Loads a posting from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job description at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid job description JSON in {}", path.display()))
    }

    /// The posting served when no job description file is configured.
    pub fn sample() -> Self {
        Self {
            title: "Software Engineer Intern".to_string(),
            description: "We are looking for a passionate Software Engineer Intern to join our \
                dynamic team. You will work on exciting projects and gain hands-on experience \
                in software development."
                .to_string(),
            requirements: "Currently pursuing a degree in Computer Science or related field. \
                Basic understanding of software development principles."
                .to_string(),
            experience: "0-1 years of experience. Previous internship experience is a plus."
                .to_string(),
            skills: parse_skill_list("JavaScript,jAVA, C++, Problem-solving"),
        }
    }

    /// True when the posting carries no text beyond its title.
    pub fn is_blank(&self) -> bool {
        self.description.trim().is_empty()
            && self.requirements.trim().is_empty()
            && self.experience.trim().is_empty()
            && self.skills.is_empty()
    }

    /// Renders the posting as the single document that gets embedded.
    pub fn to_document_text(&self) -> String {
        format!(
            "job_title: {}\njob_details: {}\nrequirements: {}\nexperience: {}\nskills: {}",
            self.title.trim(),
            self.description.trim(),
            self.requirements.trim(),
            self.experience.trim(),
            self.skills.join(", ")
        )
    }

    pub fn details_view(&self) -> JobDetailsView {
        JobDetailsView {
            job_title: self.title.clone(),
            job_details: self.description.clone(),
            requirements: self.requirements.clone(),
            experience: self.experience.clone(),
            skills: self.skills.join(", "),
        }
    }
}

/// Splits a comma-separated skill string, trimming entries and dropping
/// case-insensitive duplicates. The first spelling wins.
pub fn parse_skill_list(raw: &str) -> Vec<String> {
    dedup_skills(raw.split(',').map(str::to_string))
}

fn dedup_skills(skills: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for skill in skills {
        let trimmed = skill.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(trimmed.to_string());
    }
    out
}

fn deserialize_skills<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SkillsField {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match SkillsField::deserialize(deserializer)? {
        SkillsField::List(list) => dedup_skills(list),
        SkillsField::Csv(raw) => parse_skill_list(&raw),
    })
}
