//! Interactive numbered menu.
//!
//! Reads choices line by line from any [`BufRead`] and writes prompts and
//! results to any [`Write`]. Failed operations print an error and return to
//! the main menu. End of input leaves the menu.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::time::Duration;

use thermolog::monitor::{self, MonitorConfig};
use thermolog::{
    Component, DataSource, Direction, FileReplay, Measurement, Selection, Store, Target,
};

/// Wraps `input` in a reader that never buffers past the current line.
///
/// The stop trigger of a continuous run reads the same stdin from another
/// thread; lines the menu has not asked for must stay available to it.
pub fn line_reader<R: Read>(input: R) -> BufReader<R> {
    BufReader::with_capacity(1, input)
}

/// Creates the stop trigger for a continuous monitoring run.
pub type StopTrigger = fn() -> Box<dyn FnMut() -> bool>;

/// Interactive menu over a store and a data source.
pub struct Menu<'a, R, W> {
    input: R,
    output: W,
    store: &'a mut Store,
    source: &'a mut dyn DataSource,
    stop_trigger: StopTrigger,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    /// Creates a menu reading from `input` and writing to `output`.
    pub fn new(
        input: R,
        output: W,
        store: &'a mut Store,
        source: &'a mut dyn DataSource,
        stop_trigger: StopTrigger,
    ) -> Self {
        Self {
            input,
            output,
            store,
            source,
            stop_trigger,
        }
    }

    /// Runs the menu until the user exits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading input or writing output fails.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "Temperature recorder")?;
            writeln!(self.output, "  1. Add measurement")?;
            writeln!(self.output, "  2. Monitor")?;
            writeln!(self.output, "  3. List measurements")?;
            writeln!(self.output, "  4. Export to CSV")?;
            writeln!(self.output, "  5. Delete measurements")?;
            writeln!(self.output, "  6. Exit")?;

            let Some(choice) = self.prompt("Choose an option: ")? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => self.add()?,
                "2" => self.monitor()?,
                "3" => self.list()?,
                "4" => self.export()?,
                "5" => self.delete()?,
                "6" => return Ok(()),
                _ => writeln!(self.output, "Invalid option, please try again.")?,
            }
        }
    }

    fn add(&mut self) -> io::Result<()> {
        let Some(target) = self.choose_target("Record which component?")? else {
            return Ok(());
        };
        for (component, outcome) in
            monitor::record_all(self.source, self.store, &components_of(&target))
        {
            match outcome {
                Ok(m) => writeln!(
                    self.output,
                    "Recorded {component} temperature: {} °C",
                    m.temperature
                )?,
                Err(e) => writeln!(self.output, "Error: {component}: {e}")?,
            }
        }
        Ok(())
    }

    fn monitor(&mut self) -> io::Result<()> {
        let Some(target) = self.choose_target("Monitor which component?")? else {
            return Ok(());
        };
        let Some(duration) = self.ask_duration()? else {
            return Ok(());
        };
        let Some(interval) = self.ask_interval()? else {
            return Ok(());
        };

        let interval = Duration::from_secs(interval);
        let config = if duration == 0 {
            writeln!(self.output, "Monitoring {target}. Press Enter to stop.")?;
            MonitorConfig::continuous(interval)
        } else {
            writeln!(self.output, "Monitoring {target} for {duration}s.")?;
            MonitorConfig::bounded(Duration::from_secs(duration), interval)
        };
        let should_stop: Box<dyn FnMut() -> bool> = if config.duration.is_none() {
            (self.stop_trigger)()
        } else {
            Box::new(|| false)
        };

        let output = &mut self.output;
        let mut write_error = None;
        let result = monitor::run(
            self.source,
            self.store,
            &components_of(&target),
            config,
            should_stop,
            |(component, outcome)| {
                let written = match outcome {
                    Ok(m) => writeln!(output, "{component}: {} °C", m.temperature),
                    Err(e) => writeln!(output, "Error: {component}: {e}"),
                };
                if let Err(e) = written {
                    write_error.get_or_insert(e);
                }
            },
        );
        if let Some(e) = write_error {
            return Err(e);
        }

        match result {
            Ok(summary) => writeln!(
                self.output,
                "Monitoring completed: {} recorded, {} failed.",
                summary.recorded, summary.failed
            ),
            Err(e) => writeln!(self.output, "Error: {e}"),
        }
    }

    fn list(&mut self) -> io::Result<()> {
        let Some((target, selection)) = self.choose_range("List which component?")? else {
            return Ok(());
        };
        match self.store.read(&target, selection) {
            Ok(records) => self.print_records(&records),
            Err(e) => writeln!(self.output, "Error: {e}"),
        }
    }

    fn export(&mut self) -> io::Result<()> {
        let Some((target, selection)) = self.choose_range("Export which component?")? else {
            return Ok(());
        };
        match self.store.export_csv(&target, selection) {
            Ok(summary) => writeln!(
                self.output,
                "Exported {} record(s) to {}",
                summary.records,
                summary.path.display()
            ),
            Err(e) => writeln!(self.output, "Error: {e}"),
        }
    }

    fn delete(&mut self) -> io::Result<()> {
        let Some((target, selection)) = self.choose_range("Delete from which component?")?
        else {
            return Ok(());
        };
        match FileReplay::new(self.store).delete_measurements(&target, selection) {
            Ok(removed) => writeln!(self.output, "Deleted {} record(s).", removed.len()),
            Err(e) => writeln!(self.output, "Error: {e}"),
        }
    }

    fn print_records(&mut self, records: &[Measurement]) -> io::Result<()> {
        writeln!(
            self.output,
            "{:<12} {:>12} {:>12}",
            "Component", "Temperature", "Timestamp"
        )?;
        for m in records {
            writeln!(
                self.output,
                "{:<12} {:>12.1} {:>12}",
                m.component, m.temperature, m.timestamp
            )?;
        }
        Ok(())
    }

    /// Writes `message` and reads one trimmed line; `None` at end of input.
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        write!(self.output, "{message}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Asks for a component or all components; `None` means go back.
    fn choose_target(&mut self, title: &str) -> io::Result<Option<Target>> {
        loop {
            writeln!(self.output, "{title}")?;
            for (i, component) in Component::ALL.iter().enumerate() {
                writeln!(self.output, "  {}. {component}", i + 1)?;
            }
            writeln!(self.output, "  4. All components")?;
            writeln!(self.output, "  5. Back")?;

            let Some(choice) = self.prompt("Choose an option: ")? else {
                return Ok(None);
            };
            match choice.parse::<usize>() {
                Ok(n @ 1..=3) => return Ok(Some(Component::ALL[n - 1].into())),
                Ok(4) => return Ok(Some(Target::All)),
                Ok(5) => return Ok(None),
                _ => writeln!(self.output, "Invalid option, please try again.")?,
            }
        }
    }

    /// Asks for a target, a record count and, for bounded counts, a direction.
    fn choose_range(&mut self, title: &str) -> io::Result<Option<(Target, Selection)>> {
        let Some(target) = self.choose_target(title)? else {
            return Ok(None);
        };
        let Some(count) = self.ask_number("Number of records (0 = all): ", 0)? else {
            return Ok(None);
        };
        if count == 0 {
            return Ok(Some((target, Selection::all())));
        }

        loop {
            writeln!(self.output, "  1. From start")?;
            writeln!(self.output, "  2. From end")?;
            let Some(choice) = self.prompt("Choose an option: ")? else {
                return Ok(None);
            };
            let direction = match choice.as_str() {
                "1" => Direction::Start,
                "2" => Direction::End,
                _ => {
                    writeln!(self.output, "Invalid option, please try again.")?;
                    continue;
                }
            };
            let count = usize::try_from(count).unwrap_or(usize::MAX);
            return Ok(Some((target, Selection { count, direction })));
        }
    }

    /// Asks for a monitoring duration in seconds; `e` or `exit` goes back.
    fn ask_duration(&mut self) -> io::Result<Option<u64>> {
        loop {
            let Some(answer) =
                self.prompt("Duration in seconds (0 = until Enter, e = back): ")?
            else {
                return Ok(None);
            };
            if answer.eq_ignore_ascii_case("e") || answer.eq_ignore_ascii_case("exit") {
                return Ok(None);
            }
            match answer.parse::<u64>() {
                Ok(duration) => return Ok(Some(duration)),
                Err(_) => writeln!(self.output, "Please enter a whole number.")?,
            }
        }
    }

    fn ask_interval(&mut self) -> io::Result<Option<u64>> {
        self.ask_number("Interval in seconds (at least 1): ", 1)
    }

    /// Asks for a whole number no smaller than `min`.
    fn ask_number(&mut self, message: &str, min: u64) -> io::Result<Option<u64>> {
        loop {
            let Some(answer) = self.prompt(message)? else {
                return Ok(None);
            };
            match answer.parse::<u64>() {
                Ok(n) if n >= min => return Ok(Some(n)),
                _ => writeln!(self.output, "Please enter a whole number of at least {min}.")?,
            }
        }
    }
}

/// Returns the components addressed by a target chosen from the menu.
fn components_of(target: &Target) -> Vec<Component> {
    match target {
        Target::All => Component::ALL.to_vec(),
        Target::Component(name) => name.parse().map(|c| vec![c]).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;
    use thermolog::Result;

    /// Source returning a fixed temperature with increasing timestamps.
    struct FixedSource {
        next_timestamp: i64,
    }

    impl DataSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn measurement(&mut self, component: Component) -> Result<Measurement> {
            self.next_timestamp += 1;
            Ok(Measurement::new(component.as_str(), 50.0, self.next_timestamp))
        }
    }

    fn stop_immediately() -> Box<dyn FnMut() -> bool> {
        Box::new(|| true)
    }

    fn run_menu(store: &mut Store, script: &str) -> String {
        let mut source = FixedSource { next_timestamp: 0 };
        let mut output = Vec::new();
        Menu::new(
            Cursor::new(script.as_bytes()),
            &mut output,
            store,
            &mut source,
            stop_immediately,
        )
        .run()
        .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_add_all_then_list() {
        let temp_dir = tempdir().unwrap();
        let mut store = Store::open(temp_dir.path());

        // Add all, list all records, exit.
        let output = run_menu(&mut store, "1\n4\n3\n4\n0\n6\n");

        assert_eq!(store.read(&Target::All, Selection::all()).unwrap().len(), 3);
        assert!(output.contains("Recorded GPU temperature: 50 °C"));
        assert!(output.contains("Motherboard          50.0            3"));
    }

    #[test]
    fn test_delete_from_end() {
        let temp_dir = tempdir().unwrap();
        let mut store = Store::open(temp_dir.path());
        for ts in [1, 2, 3] {
            store.append(&Measurement::new("CPU", 40.0, ts)).unwrap();
        }

        // Delete CPU, 2 records, from end.
        let output = run_menu(&mut store, "5\n2\n2\n2\n6\n");

        assert!(output.contains("Deleted 2 record(s)."));
        assert_eq!(store.index().timestamps("CPU"), &[1]);
    }

    #[test]
    fn test_errors_return_to_menu() {
        let temp_dir = tempdir().unwrap();
        let mut store = Store::open(temp_dir.path());

        // Invalid option, list a missing component, then end of input.
        let output = run_menu(&mut store, "9\n3\n3\n0\n");

        assert!(output.contains("Invalid option, please try again."));
        assert!(output.contains("Error: "));
        assert_eq!(output.matches("6. Exit").count(), 3);
    }

    #[test]
    fn test_bounded_monitor_records_each_iteration() {
        let temp_dir = tempdir().unwrap();
        let mut store = Store::open(temp_dir.path());

        // Monitor CPU for 2s at a 1s interval: two iterations.
        let output = run_menu(&mut store, "2\n2\n2\n1\n6\n");

        assert!(output.contains("Monitoring completed: 2 recorded, 0 failed."));
        assert_eq!(store.index().len("CPU"), 2);
    }

    #[test]
    fn test_monitor_back_out_of_duration() {
        let temp_dir = tempdir().unwrap();
        let mut store = Store::open(temp_dir.path());

        let output = run_menu(&mut store, "2\n1\ne\n6\n");

        assert!(!output.contains("Monitoring completed"));
        assert!(store.index().components().next().is_none());
    }

    #[test]
    fn test_line_reader_leaves_unread_lines() {
        let temp_dir = tempdir().unwrap();
        let mut store = Store::open(temp_dir.path());
        let mut source = FixedSource { next_timestamp: 0 };
        let mut input = Cursor::new(b"6\nstop\n".to_vec());

        Menu::new(
            line_reader(&mut input),
            Vec::new(),
            &mut store,
            &mut source,
            stop_immediately,
        )
        .run()
        .unwrap();

        let mut rest = String::new();
        input.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "stop\n");
    }
}
