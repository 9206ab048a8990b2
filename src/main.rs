use std::io::{self, BufRead, IsTerminal, Write};

use cell_census::i18n::{Message, UiLanguage, t};

fn main() {
    if let Err(err) = cell_census::run() {
        eprintln!("error: {err:#}");
        if io::stdin().is_terminal() {
            eprint!("{}", t(Message::PressEnter, UiLanguage::En));
            let _ = io::stderr().flush();
            let _ = io::stdin().lock().read_line(&mut String::new());
        }
        std::process::exit(1);
    }
}
