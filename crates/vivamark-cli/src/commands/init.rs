//! The `vivamark init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create vivamark.toml
    if std::path::Path::new("vivamark.toml").exists() {
        println!("vivamark.toml already exists, skipping.");
    } else {
        std::fs::write("vivamark.toml", SAMPLE_CONFIG)?;
        println!("Created vivamark.toml");
    }

    // Create example question bank
    if std::path::Path::new("questions.json").exists() {
        println!("questions.json already exists, skipping.");
    } else {
        std::fs::write("questions.json", EXAMPLE_BANK)?;
        println!("Created questions.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit questions.json with your own question bank");
    println!("  2. Run: vivamark validate --bank questions.json");
    println!("  3. Run: vivamark exam --candidate E001");
    println!("  4. Run: vivamark mark");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# vivamark configuration

bank_path = "./questions.json"
questions_per_session = 5
duration_secs = 300
marked_output = "./marked_results.csv"

# Per-question score weights; unlisted questions weigh 1.0.
[weights]
# A1 = 2.0

[sink]
type = "csv"
path = "./results.csv"

# Remote spreadsheet backend:
# [sink]
# type = "sheets"
# sheet_id = "your-spreadsheet-id"
# api_key = "${VIVAMARK_SHEETS_KEY}"
"#;

const EXAMPLE_BANK: &str = r#"{
  "PL/SQL Basics": [
    {
      "id": "A1",
      "question": "Which keyword declares an explicit cursor?",
      "options": {
        "A": "CURSOR",
        "B": "POINTER",
        "C": "HANDLE",
        "D": "REF"
      },
      "answer": "A"
    },
    {
      "id": "A2",
      "question": "Which block section handles runtime errors?",
      "options": {
        "A": "DECLARE",
        "B": "BEGIN",
        "C": "EXCEPTION",
        "D": "END"
      },
      "answer": "C"
    },
    {
      "id": "A3",
      "question": "What does %ROWTYPE provide?",
      "options": {
        "A": "A record matching a table row",
        "B": "The number of rows in a table",
        "C": "A row-level lock",
        "D": "The current row id"
      },
      "answer": "A"
    }
  ],
  "Triggers": [
    {
      "id": "B1",
      "question": "When does a BEFORE INSERT trigger fire?",
      "options": {
        "A": "After the transaction commits",
        "B": "Before the row is inserted",
        "C": "On session logon",
        "D": "Only on rollback"
      },
      "answer": "B"
    },
    {
      "id": "B2",
      "question": "Which pseudo-records are available in a row-level trigger?",
      "options": {
        "A": ":OLD and :NEW",
        "B": ":PREV and :CURR",
        "C": ":THIS and :THAT",
        "D": ":ROW and :COL"
      },
      "answer": "A"
    }
  ]
}
"#;
