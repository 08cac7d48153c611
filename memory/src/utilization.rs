use {
    crate::{
        heap::HeapKind,
        memory::{MemoryClass, PerClass},
    },
    colorful::{core::color_string::CString, Color, Colorful as _},
};

/// Memory utilization stats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryUtilization {
    /// Number of bytes occupied by chunks.
    pub used: u64,
    /// Number of bytes of native memory allocated.
    pub allocated: u64,
}

impl std::ops::Add for MemoryUtilization {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        MemoryUtilization {
            used: self.used + other.used,
            allocated: self.allocated + other.allocated,
        }
    }
}

/// Memory utilization of one heap.
#[derive(Clone, Copy, Debug)]
pub struct HeapUtilization {
    /// Memory type of the heap.
    pub memory_type: u32,

    /// Class of the memory type.
    pub class: MemoryClass,

    /// Kind of the heap.
    pub kind: HeapKind,

    /// Number of live chunks.
    pub allocations: usize,

    /// Utilization.
    pub utilization: MemoryUtilization,
}

/// Total memory utilization.
#[derive(Clone, Debug)]
pub struct TotalMemoryUtilization {
    /// Utilization by heaps.
    pub heaps: Vec<HeapUtilization>,
}

impl TotalMemoryUtilization {
    /// Sum utilization per memory class.
    pub fn by_class(&self) -> PerClass<MemoryUtilization> {
        let mut result = PerClass::<MemoryUtilization>::default();
        for heap in &self.heaps {
            result[heap.class] = result[heap.class] + heap.utilization;
        }
        result
    }
}

impl std::fmt::Display for TotalMemoryUtilization {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const MB: u64 = 1024 * 1024;

        writeln!(fmt, "!!! Memory utilization !!!")?;
        let by_class = self.by_class();
        for &class in MemoryClass::ALL.iter() {
            let MemoryUtilization { used, allocated } = by_class[class];
            if allocated == 0 {
                continue;
            }

            let permyriad = permyriad(used, allocated);
            let fill = (permyriad / 200) as usize;
            let line = ("|".repeat(fill) + &(" ".repeat(50 - fill)))
                .gradient_with_color(Color::Green, Color::Red);
            writeln!(
                fmt,
                "{}:\n{:6} / {:<6} or{} [{}]",
                format!("{:?}", class).magenta(),
                format!("{}MB", used / MB),
                format!("{}MB", allocated / MB),
                format_permyriad(permyriad),
                line
            )?;

            for heap in self.heaps.iter().filter(|heap| heap.class == class) {
                let MemoryUtilization { used, allocated } = heap.utilization;
                writeln!(
                    fmt,
                    "         {:>6} / {:<6} or{} | type {} | {:?} | {} chunks",
                    format!("{}KB", used / 1024),
                    format!("{}KB", allocated / 1024),
                    format_permyriad(permyriad_or_zero(used, allocated)),
                    heap.memory_type,
                    heap.kind,
                    heap.allocations,
                )?;
            }
        }

        Ok(())
    }
}

fn permyriad(part: u64, total: u64) -> u64 {
    (part.saturating_mul(10000) / total).min(10000)
}

fn permyriad_or_zero(part: u64, total: u64) -> u64 {
    if total == 0 {
        0
    } else {
        permyriad(part, total)
    }
}

fn format_permyriad(permyriad: u64) -> CString {
    debug_assert!(permyriad <= 10000);
    let s = format!("{:>3}.{:02}%", permyriad / 100, permyriad % 100);
    if permyriad > 7500 {
        s.red()
    } else if permyriad > 5000 {
        s.yellow()
    } else if permyriad > 2500 {
        s.green()
    } else if permyriad > 100 {
        s.blue()
    } else {
        s.white()
    }
}
