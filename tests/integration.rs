use std::{cell::RefCell, fs, path::PathBuf, rc::Rc};

use regex::Regex;

extern crate test_generator;

use test_generator::test_resources;

use phasa::{interpret, PhasaError, Vm};

/// Expected print lines come from `// expect:` comments, an expected
/// fault from a `// expect runtime error:` comment on the faulting line.
fn parse_expectations(content: &str) -> (Vec<String>, Option<String>) {
    let output_re = Regex::new(r"// expect: ?(.*)").unwrap();
    let runtime_error_re = Regex::new(r"// expect runtime error: (.+)").unwrap();

    let mut expected_out = vec![];
    let mut expected_error = None;

    for (i, line) in content.lines().enumerate() {
        if let Some(m) = output_re.captures(line) {
            expected_out.push(m.get(1).unwrap().as_str().to_owned());
        }
        if let Some(m) = runtime_error_re.captures(line) {
            let msg = m.get(1).unwrap().as_str();
            expected_error = Some(format!("[line {}] {}", i + 1, msg));
        }
    }
    (expected_out, expected_error)
}

#[test_resources("tests/resources/*/*.psa")]
fn script(resource: &str) {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push(resource);
    let content = fs::read_to_string(&path).unwrap();
    let (expected_out, expected_error) = parse_expectations(&content);

    let output = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&output);
    let mut vm = Vm::with_output(Box::new(move |text| sink.borrow_mut().push(text.to_owned())));

    match interpret(&content, &mut vm) {
        Ok(_) => {
            assert_eq!(expected_error, None, "expected a fault in {}", resource);
        }
        Err(PhasaError::Runtime(error)) => {
            assert_eq!(Some(error.to_string()), expected_error, "in {}", resource);
        }
        Err(PhasaError::Compile(errors)) => {
            panic!("compile errors in {}: {:?}", resource, errors);
        }
    }
    assert_eq!(*output.borrow(), expected_out, "in {}", resource);
}
