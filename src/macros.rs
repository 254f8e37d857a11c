#[macro_export]
macro_rules! dummy {
    ($t:expr) => {
        ()
    };
}

/// Declares an enum of fixed hardware slots, each bound to the register its
/// register block starts at.
#[macro_export]
macro_rules! slot_def {
    (
        $(#[doc = $doc:expr])*
        $name:ident => {
            $(
                $(#[doc = $slot_doc:expr])*
                $slot:ident => $base:expr
            ),*
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
        pub enum $name {
            $(
                $(#[doc = $slot_doc])*
                $slot,
            )*
        }

        impl $name {
            #[doc = concat!("All valid options for [`", stringify!($name), "`], in index order.")]
            pub const ALL: [Self; <[_]>::len(&[$($crate::dummy!($slot)),*])] = [$(Self::$slot),*];

            #[doc = concat!("Returns the [`", stringify!($name), "`] with hardware index `index`, if there is one.")]
            pub fn from_index(index: u8) -> Option<Self> {
                Self::ALL.get(index as usize).copied()
            }

            #[doc = concat!("Hardware index of this [`", stringify!($name), "`].")]
            pub const fn index(self) -> u8 {
                self as u8
            }

            #[doc = concat!("Returns the first register of the register block backing this [`", stringify!($name), "`].")]
            pub const fn base(self) -> $crate::regs::Register {
                match self {
                    $(Self::$slot => $base,)*
                }
            }
        }
    };
}
