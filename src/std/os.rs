use std::process::Command;

// Subprocess collaborator behind `run`. Stderr is folded into stdout by
// shell redirection and the exit code is normalized: 0 on a clean exit,
// nonzero otherwise (a signal death reports 1).
pub fn run_command(cmd: &str) -> Result<(String, i32), String>
{
    let merged = format!("{} 2>&1", cmd);
    let output = if cfg!(target_os = "windows")
    {
        Command::new("cmd").args(["/C", &merged]).output()
    }
    else
    {
        Command::new("sh").arg("-c").arg(&merged).output()
    };

    match output
    {
        Ok(out) =>
        {
            let text = String::from_utf8_lossy(&out.stdout).to_string();
            let code = out.status.code().unwrap_or(1);
            Ok((text, code))
        }
        Err(err) => Err(format!("Can't run command: {err}")),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn captures_merged_output_and_code()
    {
        if cfg!(target_os = "windows")
        {
            return;
        }
        let (out, code) = run_command("echo ok").unwrap();
        assert_eq!(out.trim(), "ok");
        assert_eq!(code, 0);

        // stderr rides along with stdout
        let (out, code) = run_command("echo oops 1>&2; exit 3").unwrap();
        assert_eq!(out.trim(), "oops");
        assert_eq!(code, 3);
    }
}
