use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

// Filesystem collaborator for the file grammar forms. Every handle is
// opened and dropped inside a single call; nothing escapes to the script.

pub fn read_file(path: &str) -> std::io::Result<String>
{
    fs::read_to_string(path)
}

pub fn file_exists(path: &str) -> bool
{
    Path::new(path).exists()
}

pub fn read_lines(path: &str) -> std::io::Result<Vec<String>>
{
    let content = fs::read_to_string(path)?;
    Ok(content.lines().map(|line| line.to_string()).collect())
}

pub fn write_file(path: &str, content: &str) -> std::io::Result<()>
{
    fs::write(path, content)
}

pub fn append_file(path: &str, content: &str) -> std::io::Result<()>
{
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use std::env;

    fn temp_path(name: &str) -> std::path::PathBuf
    {
        env::temp_dir().join(format!("ironwood-file-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn write_read_append_cycle()
    {
        let path = temp_path("cycle.txt");
        let path_str = path.to_str().unwrap();

        write_file(path_str, "one\n").unwrap();
        append_file(path_str, "two\n").unwrap();
        assert!(file_exists(path_str));
        assert_eq!(read_file(path_str).unwrap(), "one\ntwo\n");
        assert_eq!(read_lines(path_str).unwrap(), vec!["one", "two"]);

        fs::remove_file(&path).unwrap();
        assert!(!file_exists(path_str));
        assert!(read_file(path_str).is_err());
    }
}
