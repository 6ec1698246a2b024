use crate::config::{AppConfig, SerialSink};
use gbi_core::{Console, ParseError};
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

const FRAME_DURATION: Duration = Duration::from_nanos(1_000_000_000 / 60);

// Test ROMs report their result over the serial port
const PASSED_MARKER: &str = "Passed";
const FAILED_MARKER: &str = "Failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Passed,
    Failed,
    FrameLimitReached,
    Suspended,
}

/// Accumulates serial output, forwards it to the configured sink and watches for a test result.
#[derive(Debug)]
struct SerialMonitor {
    sink: SerialSink,
    transcript: String,
}

impl SerialMonitor {
    fn new(sink: SerialSink) -> Self {
        Self {
            sink,
            transcript: String::new(),
        }
    }

    fn consume(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let text = String::from_utf8_lossy(bytes);
        match self.sink {
            SerialSink::Stdout => {
                let mut stdout = std::io::stdout().lock();
                if let Err(err) = stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
                    log::warn!("Unable to write serial output to stdout: {err}");
                }
            }
            SerialSink::Log => {
                for line in text.lines().filter(|line| !line.is_empty()) {
                    log::info!("Serial: {line}");
                }
            }
            SerialSink::Discard => {}
        }

        self.transcript.push_str(&text);
    }

    fn result(&self) -> Option<RunOutcome> {
        if self.transcript.contains(FAILED_MARKER) {
            Some(RunOutcome::Failed)
        } else if self.transcript.contains(PASSED_MARKER) {
            Some(RunOutcome::Passed)
        } else {
            None
        }
    }
}

/// Run frames until the program reports a result, the frame limit is hit, or the CPU suspends
/// with nothing left to wake it.
///
/// # Errors
///
/// Returns an error if the CPU reaches an illegal opcode.
pub fn run(console: &mut Console, config: &AppConfig) -> Result<RunOutcome, ParseError> {
    let mut serial_monitor = SerialMonitor::new(config.serial_sink);
    let mut frames = 0_u64;
    let mut total_cycles = 0_u64;

    loop {
        let frame_start = Instant::now();

        let summary = console.run_frame()?;
        frames += 1;
        total_cycles += u64::from(summary.cycles);

        serial_monitor.consume(&console.take_serial_output());

        if config.stop_on_result {
            if let Some(outcome) = serial_monitor.result() {
                log::info!("Program reported {outcome:?} after {frames} frames");
                return Ok(outcome);
            }
        }

        if summary.suspended {
            log::info!(
                "CPU suspended in {} after {frames} frames ({total_cycles} cycles)",
                console.cpu().mode()
            );
            return Ok(RunOutcome::Suspended);
        }

        if config.frame_limit.is_some_and(|frame_limit| frames >= frame_limit) {
            log::info!("Frame limit of {frames} reached ({total_cycles} cycles)");
            return Ok(RunOutcome::FrameLimitReached);
        }

        if config.realtime {
            let elapsed = frame_start.elapsed();
            if let Some(remaining) = FRAME_DURATION.checked_sub(elapsed) {
                thread::sleep(remaining);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbi_core::EmulationConfig;

    fn console_with_program(program: &[u8]) -> Console {
        let mut rom = vec![0x00; 0x100];
        rom.extend_from_slice(program);

        let mut console = Console::new(EmulationConfig::default());
        console
            .load_program(&rom)
            .expect("test program should fit in ROM");
        console
    }

    // LD A, <byte>; LDH (0x01), A; LD A, 0x81; LDH (0x02), A
    fn serial_write(byte: u8) -> [u8; 8] {
        [0x3E, byte, 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02]
    }

    fn quiet_config() -> AppConfig {
        AppConfig {
            serial_sink: SerialSink::Discard,
            ..AppConfig::default()
        }
    }

    #[test]
    fn passed_marker() {
        let mut program: Vec<u8> = b"Passed".iter().flat_map(|&b| serial_write(b)).collect();
        // JR -2
        program.extend_from_slice(&[0x18, 0xFE]);
        let mut console = console_with_program(&program);

        assert_eq!(Ok(RunOutcome::Passed), run(&mut console, &quiet_config()));
    }

    #[test]
    fn failed_marker() {
        let mut program: Vec<u8> = b"Failed".iter().flat_map(|&b| serial_write(b)).collect();
        program.extend_from_slice(&[0x18, 0xFE]);
        let mut console = console_with_program(&program);

        assert_eq!(Ok(RunOutcome::Failed), run(&mut console, &quiet_config()));
    }

    #[test]
    fn frame_limit() {
        let mut console = console_with_program(&[0x18, 0xFE]);
        let config = AppConfig {
            frame_limit: Some(3),
            ..quiet_config()
        };

        assert_eq!(Ok(RunOutcome::FrameLimitReached), run(&mut console, &config));
    }

    #[test]
    fn suspended() {
        // DI; HALT
        let mut console = console_with_program(&[0xF3, 0x76]);

        assert_eq!(Ok(RunOutcome::Suspended), run(&mut console, &quiet_config()));
    }

    #[test]
    fn illegal_opcode() {
        let mut console = console_with_program(&[0xFC]);

        assert_eq!(
            Err(ParseError::IllegalOpcode {
                opcode: 0xFC,
                pc: 0x0100
            }),
            run(&mut console, &quiet_config())
        );
    }
}
