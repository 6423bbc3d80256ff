use std::fs::File;
use std::io::Error;
use std::path::Path;
use tempfile::NamedTempFile;

pub const HEADER: [&str; 6] = [
    "command",
    "source",
    "source_role",
    "destination",
    "destination_role",
    "amount",
];

/// Writes a command file with the header row followed by `rows`.
pub fn write_commands(rows: &[[&str; 6]]) -> Result<NamedTempFile, Error> {
    let file = NamedTempFile::new()?;
    let mut wtr = csv::Writer::from_path(file.path())?;
    wtr.write_record(HEADER)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(file)
}

/// A super-agent funding one agent, which deposits into `subscribers`
/// accounts that then pay each other in a ring `rounds` times.
pub fn generate_ring(path: &Path, subscribers: usize, rounds: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(HEADER)?;

    wtr.write_record(["register", "boss", "super_agent", "", "", ""])?;
    wtr.write_record(["register", "agent", "agent", "", "", ""])?;
    for i in 0..subscribers {
        wtr.write_record(["register", &format!("sub-{i:05}"), "subscriber", "", "", ""])?;
    }
    let float = (subscribers * 100).to_string();
    wtr.write_record(["float", "boss", "", "", "", &float])?;
    wtr.write_record(["deposit", "boss", "super_agent", "agent", "agent", &float])?;
    for i in 0..subscribers {
        wtr.write_record([
            "deposit",
            "agent",
            "agent",
            &format!("sub-{i:05}"),
            "subscriber",
            "100",
        ])?;
    }

    for _ in 0..rounds {
        for i in 0..subscribers {
            let next = (i + 1) % subscribers;
            wtr.write_record([
                "transfer",
                &format!("sub-{i:05}"),
                "subscriber",
                &format!("sub-{next:05}"),
                "subscriber",
                "10",
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
