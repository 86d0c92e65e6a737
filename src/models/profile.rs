use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::validation::{check_len, trimmed, ValidationErrors};

pub const FULL_NAME_MAX_LEN: usize = 100;
pub const BIO_MAX_LEN: usize = 160;
pub const GENDER_MAX_LEN: usize = 20;
pub const PHONE_MAX_LEN: usize = 30;
pub const LINK_MAX_LEN: usize = 200;
pub const PLACE_MAX_LEN: usize = 100;
pub const EDUCATION_MAX_LEN: usize = 120;
pub const BIRTH_YEAR_MIN: i32 = 1900;
pub const GRADUATION_YEAR_MIN: i32 = 1900;
pub const GRADUATION_YEAR_MAX: i32 = 2100;

/// Name on a profile created at first access, until the user edits it.
pub const DEFAULT_FULL_NAME: &str = "New User";

/// Public details a user keeps about themselves. One per actor id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub school: Option<String>,
    pub college: Option<String>,
    pub university: Option<String>,
    pub degree: Option<String>,
    pub graduation_year: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            full_name: DEFAULT_FULL_NAME.to_string(),
            bio: None,
            date_of_birth: None,
            gender: None,
            phone: None,
            website: None,
            linkedin: None,
            github: None,
            country: None,
            city: None,
            school: None,
            college: None,
            university: None,
            degree: None,
            graduation_year: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces every editable field. Fields missing from `update` are
    /// cleared, like submitting the whole edit form.
    pub fn apply(&mut self, update: ProfileUpdate, now: DateTime<Utc>) {
        self.full_name = update.full_name;
        self.bio = update.bio;
        self.date_of_birth = update.date_of_birth;
        self.gender = update.gender;
        self.phone = update.phone;
        self.website = update.website;
        self.linkedin = update.linkedin;
        self.github = update.github;
        self.country = update.country;
        self.city = update.city;
        self.school = update.school;
        self.college = update.college;
        self.university = update.university;
        self.degree = update.degree;
        self.graduation_year = update.graduation_year;
        self.updated_at = now;
    }
}

/// Client-editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub bio: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub school: Option<String>,
    pub college: Option<String>,
    pub university: Option<String>,
    pub degree: Option<String>,
    pub graduation_year: Option<i32>,
}

fn check_optional(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &Option<String>,
    max: usize,
) {
    if let Some(value) = value {
        check_len(errors, field, value, max, false);
    }
}

fn is_phone(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | '.' | ' '))
}

fn is_web_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"));
    matches!(rest, Some(rest) if !rest.is_empty() && !rest.contains(char::is_whitespace))
}

impl ProfileUpdate {
    pub fn normalized(mut self) -> Self {
        self.full_name = self.full_name.trim().to_string();
        self.bio = trimmed(self.bio);
        self.gender = trimmed(self.gender);
        self.phone = trimmed(self.phone);
        self.website = trimmed(self.website);
        self.linkedin = trimmed(self.linkedin);
        self.github = trimmed(self.github);
        self.country = trimmed(self.country);
        self.city = trimmed(self.city);
        self.school = trimmed(self.school);
        self.college = trimmed(self.college);
        self.university = trimmed(self.university);
        self.degree = trimmed(self.degree);
        self
    }

    /// Checks lengths and formats. `today` bounds the date of birth.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        check_len(
            &mut errors,
            "full_name",
            &self.full_name,
            FULL_NAME_MAX_LEN,
            true,
        );
        check_optional(&mut errors, "bio", &self.bio, BIO_MAX_LEN);
        check_optional(&mut errors, "gender", &self.gender, GENDER_MAX_LEN);

        check_optional(&mut errors, "phone", &self.phone, PHONE_MAX_LEN);
        if matches!(&self.phone, Some(phone) if !is_phone(phone)) {
            errors.add("phone", "phone is not a valid phone number.");
        }

        for (field, link) in [
            ("website", &self.website),
            ("linkedin", &self.linkedin),
            ("github", &self.github),
        ] {
            check_optional(&mut errors, field, link, LINK_MAX_LEN);
            if matches!(link, Some(url) if !is_web_url(url)) {
                errors.add(field, format!("{} must be an http or https URL.", field));
            }
        }

        check_optional(&mut errors, "country", &self.country, PLACE_MAX_LEN);
        check_optional(&mut errors, "city", &self.city, PLACE_MAX_LEN);
        check_optional(&mut errors, "school", &self.school, EDUCATION_MAX_LEN);
        check_optional(&mut errors, "college", &self.college, EDUCATION_MAX_LEN);
        check_optional(
            &mut errors,
            "university",
            &self.university,
            EDUCATION_MAX_LEN,
        );
        check_optional(&mut errors, "degree", &self.degree, EDUCATION_MAX_LEN);

        if let Some(born) = self.date_of_birth {
            if born > today {
                errors.add("date_of_birth", "Date of birth cannot be in the future.");
            } else if born.year() < BIRTH_YEAR_MIN {
                errors.add(
                    "date_of_birth",
                    format!("Date of birth cannot be before {}.", BIRTH_YEAR_MIN),
                );
            }
        }

        if let Some(year) = self.graduation_year {
            if !(GRADUATION_YEAR_MIN..=GRADUATION_YEAR_MAX).contains(&year) {
                errors.add(
                    "graduation_year",
                    format!(
                        "graduation_year must be between {} and {}.",
                        GRADUATION_YEAR_MIN, GRADUATION_YEAR_MAX
                    ),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn update() -> ProfileUpdate {
        ProfileUpdate {
            full_name: "Ada Byron".to_string(),
            bio: Some("Competitive programmer".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(2001, 12, 10),
            phone: Some("+880 (17) 1234-5678".to_string()),
            website: Some("https://ada.dev".to_string()),
            github: Some("http://github.com/ada".to_string()),
            university: Some("University of Dhaka".to_string()),
            graduation_year: Some(2024),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_update_passes() {
        assert!(update().validate(today()).is_ok());
    }

    #[test]
    fn test_length_limits() {
        let mut u = update();
        u.full_name = "x".repeat(FULL_NAME_MAX_LEN + 1);
        u.bio = Some("b".repeat(BIO_MAX_LEN + 1));
        u.gender = Some("g".repeat(GENDER_MAX_LEN));
        u.city = Some("c".repeat(PLACE_MAX_LEN + 1));
        u.degree = Some("d".repeat(EDUCATION_MAX_LEN + 1));

        let errors = u.validate(today()).unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, vec!["full_name", "bio", "city", "degree"]);
    }

    #[test]
    fn test_full_name_is_required() {
        let u = ProfileUpdate {
            full_name: "   ".to_string(),
            ..Default::default()
        }
        .normalized();
        let errors = u.validate(today()).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["full_name"]);
    }

    #[test]
    fn test_phone_and_links_are_checked() {
        let mut u = update();
        u.phone = Some("call me".to_string());
        u.website = Some("ada.dev".to_string());
        u.linkedin = Some("https://".to_string());
        u.github = Some("ftp://github.com/ada".to_string());

        let errors = u.validate(today()).unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, vec!["phone", "website", "linkedin", "github"]);
    }

    #[test]
    fn test_dates_and_years_are_bounded() {
        let mut u = update();
        u.date_of_birth = NaiveDate::from_ymd_opt(2025, 6, 2);
        u.graduation_year = Some(1899);

        let errors = u.validate(today()).unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, vec!["date_of_birth", "graduation_year"]);

        u.date_of_birth = Some(today());
        u.graduation_year = Some(GRADUATION_YEAR_MAX);
        assert!(u.validate(today()).is_ok());
    }

    #[test]
    fn test_normalized_drops_blank_optionals() {
        let mut u = update();
        u.full_name = "  Ada  ".to_string();
        u.country = Some("   ".to_string());
        u.city = Some(" Dhaka ".to_string());

        let u = u.normalized();
        assert_eq!(u.full_name, "Ada");
        assert_eq!(u.country, None);
        assert_eq!(u.city.as_deref(), Some("Dhaka"));
    }

    #[test]
    fn test_apply_replaces_editable_fields_only() {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let later = created + Duration::days(1);
        let mut profile = UserProfile::new("u1", created);
        profile.school = Some("Old school".to_string());

        profile.apply(update(), later);
        assert_eq!(profile.user_id, "u1");
        assert_eq!(profile.full_name, "Ada Byron");
        assert_eq!(profile.school, None);
        assert_eq!(profile.graduation_year, Some(2024));
        assert_eq!(profile.created_at, created);
        assert_eq!(profile.updated_at, later);
    }
}
