use bfi::{Interpreter, Machine, Program};
use std::io;

fn main() {
    // Classic Brainfuck "Hello World!" program
    let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";

    let program = match Program::try_from(code) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("Brainfuck load error: {err}");
            std::process::exit(1);
        }
    };

    let mut bf = Interpreter::new(io::stdin(), io::stdout());
    if let Err(err) = bf.run(&program) {
        eprintln!("Brainfuck interpreter error: {err}");
        std::process::exit(1);
    }

    // A machine can also be prepared up front and inspected afterwards.
    let mut machine = Machine::new();
    machine.tape.set(3);
    let mover = Program::try_from("[>+<-]").expect("fits");
    let mut bf = Interpreter::with_machine(machine, io::empty(), io::sink());
    bf.run(&mover).expect("balanced program");
    println!("moved value: {}", bf.machine().tape.cells()[1]);
}
