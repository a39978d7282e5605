// RTC driver for PCF85063A/PCF85063TP real-time clock chips.
// Datasheet: https://files.waveshare.com/wiki/common/Pcf85063atl1118-NdPQpTGE-loeW7GbZ7.pdf
//
// The watch face only needs the time once at boot: it seeds a `SoftClock`
// which then runs off the system timer.

use embedded_hal::i2c::I2c;

pub const PCF85063_ADDR: u8 = 0x51;

// Time registers start at 0x04: sec, min, hour, day, weekday, month, year
const REG_SECONDS: u8 = 0x04;
const OS_FLAG: u8 = 0x80; // oscillator stopped, time unreliable
const CENTURY_FLAG: u8 = 0x80;

const SECS_PER_DAY: u64 = 86_400;
// Days from 0000-03-01 to 1970-01-01 in the proleptic Gregorian calendar
const EPOCH_SHIFT_DAYS: i64 = 719_468;
const DAYS_PER_ERA: i64 = 146_097;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,  // full year, e.g., 2024
    pub month: u8,  // 1-12
    pub day: u8,    // 1-31
    pub hour: u8,   // 0-23
    pub minute: u8, // 0-59
    pub second: u8, // 0-59
}

impl DateTime {
    // Basic sanity check on decoded RTC time.
    pub fn is_valid(&self) -> bool {
        (2020..=2099).contains(&self.year)
            && (1..=12).contains(&self.month)
            && (1..=31).contains(&self.day)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }

    /// Seconds since 1970-01-01T00:00:00 UTC.
    pub fn to_unix(&self) -> u64 {
        let days = days_from_civil(self.year as i64, self.month as i64, self.day as i64);
        let secs_of_day =
            self.hour as u64 * 3600 + self.minute as u64 * 60 + self.second as u64;
        days.max(0) as u64 * SECS_PER_DAY + secs_of_day
    }

    pub fn from_unix(ts: u64) -> Self {
        let days = (ts / SECS_PER_DAY) as i64;
        let rem = ts % SECS_PER_DAY;
        let (year, month, day) = civil_from_days(days);
        Self {
            year: year as u16,
            month: month as u8,
            day: day as u8,
            hour: (rem / 3600) as u8,
            minute: ((rem % 3600) / 60) as u8,
            second: (rem % 60) as u8,
        }
    }
}

// Eras are 400-year blocks starting in March so the leap day falls last.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400; // year of era
    let mp = (month + 9) % 12; // March = 0
    let doy = (153 * mp + 2) / 5 + day - 1; // day of year, from March 1
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // day of era
    era * DAYS_PER_ERA + doe - EPOCH_SHIFT_DAYS
}

fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + EPOCH_SHIFT_DAYS;
    let era = z.div_euclid(DAYS_PER_ERA);
    let doe = z - era * DAYS_PER_ERA;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

// BCD encode/decode helpers
#[inline]
fn bcd_decode(v: u8) -> u8 {
    (v & 0x0F) + ((v >> 4) * 10)
}

#[inline]
fn bcd_encode(v: u8) -> u8 {
    ((v / 10) << 4) | (v % 10)
}

#[derive(Debug, PartialEq, Eq)]
pub enum RtcError<E> {
    Bus(E),
    // Oscillator stopped since the last set; the registers hold garbage
    IntegrityLost,
    InvalidTime(DateTime),
}

impl<E> From<E> for RtcError<E> {
    fn from(e: E) -> Self {
        RtcError::Bus(e)
    }
}

pub struct Pcf85063<I2C> {
    i2c: I2C,
}

impl<I2C, E> Pcf85063<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    pub fn into_inner(self) -> I2C {
        self.i2c
    }

    /// Read the calendar registers.
    pub fn read_datetime(&mut self) -> Result<DateTime, RtcError<E>> {
        let mut buf = [0u8; 7];
        self.i2c.write_read(PCF85063_ADDR, &[REG_SECONDS], &mut buf)?;

        if buf[0] & OS_FLAG != 0 {
            return Err(RtcError::IntegrityLost);
        }

        let month_raw = buf[5];
        let century = if month_raw & CENTURY_FLAG != 0 { 1900 } else { 2000 };
        let dt = DateTime {
            second: bcd_decode(buf[0] & 0x7F),
            minute: bcd_decode(buf[1] & 0x7F),
            hour: bcd_decode(buf[2] & 0x3F),
            day: bcd_decode(buf[3] & 0x3F),
            // buf[4] is the weekday, not used
            month: bcd_decode(month_raw & 0x1F),
            year: century + bcd_decode(buf[6]) as u16,
        };

        if !dt.is_valid() {
            return Err(RtcError::InvalidTime(dt));
        }
        Ok(dt)
    }

    /// Write the calendar registers. Clears the oscillator-stopped flag.
    pub fn set_datetime(&mut self, dt: &DateTime) -> Result<(), RtcError<E>> {
        if !dt.is_valid() {
            return Err(RtcError::InvalidTime(*dt));
        }
        let data = [
            REG_SECONDS,
            bcd_encode(dt.second),
            bcd_encode(dt.minute),
            bcd_encode(dt.hour),
            bcd_encode(dt.day),
            0, // weekday not used
            bcd_encode(dt.month),
            bcd_encode((dt.year % 100) as u8),
        ];
        self.i2c.write(PCF85063_ADDR, &data)?;
        Ok(())
    }

    pub fn read_unix(&mut self) -> Result<u64, RtcError<E>> {
        self.read_datetime().map(|dt| dt.to_unix())
    }

    pub fn set_unix(&mut self, ts: u64) -> Result<(), RtcError<E>> {
        self.set_datetime(&DateTime::from_unix(ts))
    }
}
