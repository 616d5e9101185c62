use std::io::{self, BufRead, Write};

use crate::aws::AwsRole;

/// Display form for a role: the account alias with the account ID when the
/// alias has been resolved, the bare role ARN otherwise. Kept out of the data
/// model on purpose; presentation is the UI's business.
pub fn display_role(role: &AwsRole) -> String {
    if role.account_alias.is_empty() {
        role.role_arn.clone()
    } else {
        format!("{} ({})", role.account_alias, role.account_id())
    }
}

pub fn read_from_stdin(prompt: &str) -> String {
    let stdin = io::stdin();
    let mut text = String::new();
    while text.trim().is_empty() {
        print!("{}: ", prompt);
        io::stdout().flush().expect("could not flush stdout");
        text.clear();
        stdin
            .lock()
            .read_line(&mut text)
            .expect("could not read from stdin");
    }
    text.trim().to_string()
}

/// Numbered selection prompt over the catalog. Re-prompts until the input is
/// a valid index. An empty catalog is an error, not a prompt.
pub fn select_role(roles: &[AwsRole]) -> anyhow::Result<&AwsRole> {
    anyhow::ensure!(
        !roles.is_empty(),
        "the SAML assertion carries no roles to select from"
    );
    if roles.len() == 1 {
        return Ok(&roles[0]);
    }

    println!("Available roles:");
    for (i, role) in roles.iter().enumerate() {
        println!("  [{}] {}", i + 1, display_role(role));
    }

    loop {
        let answer = read_from_stdin("Select AWS role");
        match answer.parse::<usize>() {
            Ok(n) if (1..=roles.len()).contains(&n) => return Ok(&roles[n - 1]),
            _ => println!("Enter a number between 1 and {}", roles.len()),
        }
    }
}
