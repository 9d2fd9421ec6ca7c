//! Inserts the public character roster from `characters.json` into the
//! database. Seeded characters are non-personal and have no owner.

use anyhow::{Context, Result};
use diesel::{Connection, PgConnection, RunQueryDsl};
use serde::Deserialize;
use std::fs;

use masquerade_backend::models::characters::{NewCharacter, encode_string_list};
use masquerade_backend::schema::characters;

#[derive(Deserialize, Debug)]
struct SeedFile {
    characters: Vec<SeedCharacter>,
}

#[derive(Deserialize, Debug)]
struct SeedCharacter {
    name: String,
    nationality: Option<String>,
    profession: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    background: Option<String>,
    personality_traits: Option<Vec<String>>,
    motivations: Option<String>,
    quirks_habits: Option<Vec<String>>,
    example_sentences: Option<Vec<String>>,
}

impl SeedCharacter {
    fn into_new_character(self) -> Result<NewCharacter> {
        Ok(NewCharacter {
            user_id: None,
            name: self.name,
            nationality: self.nationality,
            profession: self.profession,
            description: self.description,
            image_url: self.image_url,
            background: self.background,
            personality_traits: encode_list(self.personality_traits)?,
            motivations: self.motivations,
            quirks_habits: encode_list(self.quirks_habits)?,
            example_sentences: encode_list(self.example_sentences)?,
            is_personal: false,
        })
    }
}

fn encode_list(items: Option<Vec<String>>) -> Result<Option<String>> {
    items
        .map(|items| encode_string_list(&items).map_err(|e| anyhow::anyhow!(e.to_string())))
        .transpose()
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let data = fs::read_to_string("characters.json")
        .context("characters.json not found in project root")?;
    let seed_file: SeedFile =
        serde_json::from_str(&data).context("Failed to parse characters.json")?;

    let rows: Vec<NewCharacter> = seed_file
        .characters
        .into_iter()
        .map(SeedCharacter::into_new_character)
        .collect::<Result<_>>()?;

    let mut conn =
        PgConnection::establish(&database_url).context("Failed to connect to database")?;

    let inserted = conn.transaction::<usize, anyhow::Error, _>(|conn| {
        diesel::insert_into(characters::table)
            .values(&rows)
            .execute(conn)
            .map_err(Into::into)
    })?;

    println!("Inserted {inserted} characters.");
    Ok(())
}
