use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::Db,
    models::{
        EmployerProfile, EmployerProfileRow, Profile, ProfileRow, Role, RoleStub, StudentProfile,
        StudentProfileRow,
    },
    onboarding::{
        EmployerBranding, EmployerLocation, EmployerVenue, OnboardingSlice, StudentAbout,
        StudentPreferences, StudentSkills,
    },
};

use super::{ProfileStore, StoreError, StoreResult};

/// [`ProfileStore`] over the MySQL pool.
#[derive(Clone)]
pub struct MySqlProfileStore {
    pool: Db,
}

impl MySqlProfileStore {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }
}

/// Narrow constraint violations: a unique key becomes [`StoreError::Duplicate`]
/// naming `row`, a foreign key becomes [`StoreError::MissingParent`] naming
/// `parent`.
fn write_error(err: sqlx::Error, row: &'static str, parent: &'static str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate(row);
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingParent(parent);
        }
    }
    StoreError::Database(err)
}

/// Make sure the student row that skills and preferences hang off exists.
async fn ensure_student_row(conn: &mut sqlx::MySqlConnection, id: &str) -> StoreResult<()> {
    sqlx::query("INSERT INTO student_profiles (id) VALUES (?) ON DUPLICATE KEY UPDATE id = id")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| write_error(e, "student profile", "profile"))?;
    Ok(())
}

#[async_trait]
impl ProfileStore for MySqlProfileStore {
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, role, onboarding_completed FROM profiles WHERE id = ? LIMIT 1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Profile::try_from).transpose()?)
    }

    async fn insert_profile(&self, user_id: Uuid, role: Role) -> StoreResult<Profile> {
        sqlx::query("INSERT INTO profiles (id, role, onboarding_completed) VALUES (?, ?, 0)")
            .bind(user_id.to_string())
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, "profile", "identity"))?;

        Ok(Profile { id: user_id, role: Some(role), onboarding_completed: false })
    }

    async fn insert_role_profile(&self, stub: &RoleStub) -> StoreResult<()> {
        match stub {
            RoleStub::Student { id, first_name, last_name, email } => {
                sqlx::query(
                    "INSERT INTO student_profiles (id, first_name, last_name, email) VALUES (?, ?, ?, ?)",
                )
                .bind(id.to_string())
                .bind(first_name)
                .bind(last_name)
                .bind(email)
                .execute(&self.pool)
                .await
                .map_err(|e| write_error(e, "student profile", "profile"))?;
            }
            RoleStub::Employer { id, contact_name, contact_email } => {
                sqlx::query(
                    "INSERT INTO employer_profiles (id, contact_name, contact_email) VALUES (?, ?, ?)",
                )
                .bind(id.to_string())
                .bind(contact_name)
                .bind(contact_email)
                .execute(&self.pool)
                .await
                .map_err(|e| write_error(e, "employer profile", "profile"))?;
            }
        }
        Ok(())
    }

    async fn save_slice(&self, user_id: Uuid, slice: &OnboardingSlice) -> StoreResult<()> {
        let id = user_id.to_string();
        match slice {
            OnboardingSlice::About(about)      => self.save_about(&id, about).await,
            OnboardingSlice::Skills(skills)    => self.replace_skills(&id, skills).await,
            OnboardingSlice::Preferences(p)    => self.save_preferences(&id, p).await,
            OnboardingSlice::Venue(venue)      => self.save_venue(&id, venue).await,
            OnboardingSlice::Location(loc)     => self.save_location(&id, loc).await,
            OnboardingSlice::Branding(brand)   => self.save_branding(&id, brand).await,
        }
    }

    async fn complete_onboarding(&self, user_id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE profiles SET onboarding_completed = 1 WHERE id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn student_profile(&self, user_id: Uuid) -> StoreResult<Option<StudentProfile>> {
        let row = sqlx::query_as::<_, StudentProfileRow>(
            "SELECT id, first_name, last_name, email, phone, university, year_of_study, bio
             FROM student_profiles WHERE id = ? LIMIT 1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StudentProfile::try_from).transpose()?)
    }

    async fn employer_profile(&self, user_id: Uuid) -> StoreResult<Option<EmployerProfile>> {
        let row = sqlx::query_as::<_, EmployerProfileRow>(
            "SELECT id, business_name, contact_name, contact_email, phone, venue_type, description,
                    address, area, city, postcode, logo_url, website, tagline
             FROM employer_profiles WHERE id = ? LIMIT 1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EmployerProfile::try_from).transpose()?)
    }
}

// ── Step writes ───────────────────────────────────────────────

impl MySqlProfileStore {
    async fn save_about(&self, id: &str, about: &StudentAbout) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO student_profiles (id, first_name, last_name, phone, university, year_of_study, bio)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE
                first_name    = VALUES(first_name),
                last_name     = VALUES(last_name),
                phone         = VALUES(phone),
                university    = VALUES(university),
                year_of_study = VALUES(year_of_study),
                bio           = VALUES(bio)",
        )
        .bind(id)
        .bind(&about.first_name)
        .bind(&about.last_name)
        .bind(&about.phone)
        .bind(&about.university)
        .bind(about.year_of_study)
        .bind(&about.bio)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "student profile", "profile"))?;
        Ok(())
    }

    /// Replace the whole skill set in one transaction.
    async fn replace_skills(&self, id: &str, skills: &StudentSkills) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        ensure_student_row(&mut *tx, id).await?;

        sqlx::query("DELETE FROM student_skills WHERE student_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for skill in &skills.skills {
            sqlx::query(
                "INSERT INTO student_skills (id, student_id, name, proficiency, skill_type, years_experience)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(id)
            .bind(skill.name.trim())
            .bind(skill.proficiency.as_str())
            .bind(skill.skill_type.as_str())
            .bind(skill.years_experience)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, "skill", "student profile"))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn save_preferences(&self, id: &str, prefs: &StudentPreferences) -> StoreResult<()> {
        let availability   = serde_json::to_string(&prefs.availability)?;
        let categories     = serde_json::to_string(&prefs.categories)?;
        let areas          = serde_json::to_string(&prefs.areas)?;
        let schedule_types = serde_json::to_string(&prefs.schedule_types)?;

        let mut tx = self.pool.begin().await?;
        ensure_student_row(&mut *tx, id).await?;

        sqlx::query(
            "INSERT INTO student_preferences (student_id, availability, categories, areas, schedule_types, min_hourly_pay)
             VALUES (?, ?, ?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE
                availability   = VALUES(availability),
                categories     = VALUES(categories),
                areas          = VALUES(areas),
                schedule_types = VALUES(schedule_types),
                min_hourly_pay = VALUES(min_hourly_pay)",
        )
        .bind(id)
        .bind(availability)
        .bind(categories)
        .bind(areas)
        .bind(schedule_types)
        .bind(prefs.min_hourly_pay)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "preferences", "student profile"))?;

        tx.commit().await?;
        Ok(())
    }

    async fn save_venue(&self, id: &str, venue: &EmployerVenue) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO employer_profiles (id, business_name, contact_name, venue_type, description, phone)
             VALUES (?, ?, ?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE
                business_name = VALUES(business_name),
                contact_name  = COALESCE(VALUES(contact_name), contact_name),
                venue_type    = VALUES(venue_type),
                description   = VALUES(description),
                phone         = VALUES(phone)",
        )
        .bind(id)
        .bind(&venue.business_name)
        .bind(&venue.contact_name)
        .bind(&venue.venue_type)
        .bind(&venue.description)
        .bind(&venue.phone)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "employer profile", "profile"))?;
        Ok(())
    }

    async fn save_location(&self, id: &str, loc: &EmployerLocation) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO employer_profiles (id, address, area, city, postcode)
             VALUES (?, ?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE
                address  = VALUES(address),
                area     = VALUES(area),
                city     = VALUES(city),
                postcode = VALUES(postcode)",
        )
        .bind(id)
        .bind(&loc.address)
        .bind(&loc.area)
        .bind(&loc.city)
        .bind(&loc.postcode)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "employer profile", "profile"))?;
        Ok(())
    }

    async fn save_branding(&self, id: &str, brand: &EmployerBranding) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO employer_profiles (id, logo_url, website, tagline)
             VALUES (?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE
                logo_url = VALUES(logo_url),
                website  = VALUES(website),
                tagline  = VALUES(tagline)",
        )
        .bind(id)
        .bind(&brand.logo_url)
        .bind(&brand.website)
        .bind(&brand.tagline)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "employer profile", "profile"))?;
        Ok(())
    }
}
