use colored::Colorize;
use soarctl_core::ApplyOutcome;

pub fn report(kind: &str, name: &str, outcome: &ApplyOutcome) {
    if outcome.changed {
        let message = outcome.message.as_deref().unwrap_or("changed");
        println!("{} {}", "+".green(), message);
    } else {
        println!("{} {} {} unchanged", "~".dimmed(), kind, name);
    }
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}
