use kl_tape::Printer;
//
// cargo run --example read_tape
//
// Reports the mounted tape cartridge without printing anything.
//

fn main() {
    env_logger::init();

    match Printer::open() {
        Ok(mut printer) => {
            if let Err(err) = printer.check_status() {
                println!("Printer not ready: {:?}", err);
                return;
            }
            match printer.query_tape() {
                Ok(Some(tape)) => println!("Mounted tape: {} mm", tape.width_mm()),
                Ok(None) => println!("No tape cartridge detected"),
                Err(err) => println!("Error {:?}", err),
            }
        }
        Err(err) => panic!("Can't open printer: {}", err),
    }
}
