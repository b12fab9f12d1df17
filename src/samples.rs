//! Built-in LoLa programs

/// Printed to the console before the first program runs.
pub const GREETING: &str = "Your program output will appear here!\n";

/// A named, ready-to-run program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub name: &'static str,
    pub source: &'static str,
}

pub const SAMPLES: &[Sample] = &[
    Sample {
        name: "Hello, World!",
        source: HELLO_WORLD,
    },
    Sample {
        name: "Bubblesort",
        source: BUBBLESORT,
    },
    Sample {
        name: "Simple Timer",
        source: SIMPLE_TIMER,
    },
    Sample {
        name: "Stack Trace",
        source: STACK_TRACE,
    },
];

/// Sample at catalog position `index`.
pub fn find(index: usize) -> Option<&'static Sample> {
    SAMPLES.get(index)
}

/// Sample whose name matches `name`, ignoring ASCII case.
pub fn find_by_name(name: &str) -> Option<&'static Sample> {
    SAMPLES
        .iter()
        .find(|sample| sample.name.eq_ignore_ascii_case(name))
}

const HELLO_WORLD: &str = r#"// Enter LoLa code here and run it to compile & execute the code!
Print("Hello, World!");
while(true) {
  var str = Read();
  if(str != "")
    Write("[", str, "]");
}

// Available functions are:
// - All of the standard library
// - "Print(…): void" Prints all arguments, then writes a new line
// - "Write(…): void" Prints all arguments without appending a new line
// - "Read(): string" Reads all available text from the terminal.
"#;

const BUBBLESORT: &str = r#"function BubbleSort(const_arr)
{
  var arr = const_arr;
  var len = Length(arr);

  var n = len;
  while(n > 1) {

    var i = 0;
    while(i < n - 1) {
      if (arr[i] > arr[i+1]) {
        var tmp = arr[i];
        arr[i] = arr[i+1];
        arr[i+1] = tmp;
      }

      i += 1;
    }
    n -= 1;
  }

  return arr;
}

// Sorting works on numbers
Print(BubbleSort([ 7, 8, 9, 3, 2, 1 ]));

// as well as strings
Print(BubbleSort([
  "scorn",
  "by nature",
  "Agave cantala",
  "solvophobic",
  "outpost",
  "ovotestis",
  "weather",
  "ablation",
  "boresighting",
  "postfix"
]));
"#;

const SIMPLE_TIMER: &str = r#"while(true) {
  Print(Timestamp());
  Yield();
}
"#;

const STACK_TRACE: &str = r#"function Nested() {
    Boom();
}

function Deeply() {
    Nested();
}

function Within() {
    Deeply();
}

Within();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order() {
        let names: Vec<_> = SAMPLES.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            ["Hello, World!", "Bubblesort", "Simple Timer", "Stack Trace"]
        );
    }

    #[test]
    fn test_find() {
        assert_eq!(find(1).map(|s| s.name), Some("Bubblesort"));
        assert!(find(SAMPLES.len()).is_none());
        assert_eq!(find_by_name("stack trace"), find(3));
    }

    #[test]
    fn test_default_program_is_interactive() {
        let hello = find(0).unwrap();
        assert!(hello.source.contains("Read()"));
        assert!(SAMPLES.iter().all(|s| !s.source.trim().is_empty()));
    }
}
