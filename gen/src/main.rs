use std::env::args;
use std::io::{BufWriter, Write};
use std::process::exit;

fn main() {
    let argv = args().collect::<Vec<_>>();
    let (count, distinct): (usize, Option<u32>) = match &argv[..] {
        [_, count_str] => (count_str.parse().expect("invalid count"), None),
        [_, count_str, distinct_str] => (
            count_str.parse().expect("invalid count"),
            Some(distinct_str.parse().expect("invalid distinct")),
        ),
        _ => {
            println!("Usage: gen <count> [distinct]");
            exit(1);
        }
    };

    let stdlock = std::io::stdout().lock();

    let mut bufout = BufWriter::new(stdlock);
    gen::gen(count, distinct)
        .for_each(|addr| {
            writeln!(bufout, "{addr}").unwrap();
        })
}
