use finch::Command;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if handle_cli_flags(&args) {
        return;
    }

    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    if let Err(err) = finch::run(command) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags(args: &[String]) -> bool {
    let mut saw_flag = false;
    for arg in args {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("Finch {}", finch::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "Finch — Browse your feed from the terminal.\n\nUsage: finch [COMMAND]\n\nCommands:\n  (none)               Render the home feed and check for new posts\n  search <query>       Search posts\n  like / unlike <id>   Toggle a like\n  bookmark / unbookmark <id>\n  repost / unrepost <id>\n  follow / unfollow <user-id>\n\nFlags:\n  --version, -V        Show version and exit\n  --help,    -h        Show this help message"
                );
                saw_flag = true;
            }
            _ => {}
        }
    }
    saw_flag
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let Some((first, rest)) = args.split_first() else {
        return Ok(Command::Feed);
    };

    let target = |what: &str| -> Result<String, String> {
        rest.first()
            .map(|s| s.to_string())
            .ok_or_else(|| format!("finch {first}: missing {what} (try --help)"))
    };

    match first.as_str() {
        "search" => {
            if rest.is_empty() {
                return Err("finch search: missing query (try --help)".into());
            }
            Ok(Command::Search {
                query: rest.join(" "),
            })
        }
        "like" => Ok(Command::Like {
            post_id: target("post id")?,
            on: true,
        }),
        "unlike" => Ok(Command::Like {
            post_id: target("post id")?,
            on: false,
        }),
        "bookmark" => Ok(Command::Bookmark {
            post_id: target("post id")?,
            on: true,
        }),
        "unbookmark" => Ok(Command::Bookmark {
            post_id: target("post id")?,
            on: false,
        }),
        "repost" => Ok(Command::Repost {
            post_id: target("post id")?,
            on: true,
        }),
        "unrepost" => Ok(Command::Repost {
            post_id: target("post id")?,
            on: false,
        }),
        "follow" => Ok(Command::Follow {
            user_id: target("user id")?,
            on: true,
        }),
        "unfollow" => Ok(Command::Follow {
            user_id: target("user id")?,
            on: false,
        }),
        other => Err(format!("finch: unknown command {other:?} (try --help)")),
    }
}
