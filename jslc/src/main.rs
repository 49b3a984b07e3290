mod cmd;
mod error;

fn main() {
    std::process::exit(cmd::cmd());
}
